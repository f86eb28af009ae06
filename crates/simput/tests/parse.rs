//! End-to-end pipeline tests
//!
//! Each fixture in tests/inputs/ is parsed against tests/inputs/schema.json
//! and the resulting tree is compared structurally.

use pretty_assertions::assert_eq;
use serde_json::json;
use simput::error::{InputError, ParserError, PreprocessorError};
use simput::parser::InputParser;
use simput::preprocessor::Preprocessor;
use simput::schema::Schema;
use std::path::{Path, PathBuf};
use std::sync::Once;

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_env("SIMPUT_LOG"))
            .with_writer(std::io::stderr)
            .init();
    });
}

fn inputs_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/inputs")
}

fn parse_fixture_with(
    name: &str,
    bindings: &[(&str, &str)],
) -> Result<serde_json::Value, InputError> {
    init_tracing();

    let dir = inputs_dir();
    let schema = Schema::load_file(&dir.join("schema.json")).expect("schema fixture loads");

    let mut preprocessor =
        Preprocessor::from_path(&dir.join(name), &dir).expect("fixture file opens");
    for (name, value) in bindings {
        preprocessor.define(name, value);
    }

    InputParser::new(&schema)
        .parse(preprocessor)
        .map(|tree| serde_json::to_value(tree).expect("tree serializes"))
}

fn parse_fixture(name: &str) -> Result<serde_json::Value, InputError> {
    parse_fixture_with(name, &[])
}

#[test]
fn water_fixture_builds_the_full_tree() {
    let tree = parse_fixture("water.inp").unwrap();

    assert_eq!(
        tree,
        json!({
            "+GLOBAL": {
                "PROJECT": "water",
                "RUN_TYPE": "ENERGY",
                "WALLTIME": 3600,
            },
            "+FORCE_EVAL": {
                "_": "QS",
                "STRESS_TENSOR": true,
                "+SUBSYS": {
                    "+CELL": {"ABC": [12.0, 12.0, 12.0]},
                    "+COORD": {
                        "ATOMS": [
                            "O 0.000 0.000 0.000",
                            "H 0.757 0.586 0.000",
                            "H -0.757 0.586 0.000",
                        ],
                    },
                    "+KIND": [
                        {"_": "H", "ELEMENT": "H", "BASIS_SET": "DZVP"},
                        {"_": "O", "ELEMENT": "O", "BASIS_SET": ["DZVP", "AUX"]},
                    ],
                },
            },
        })
    );
}

#[test]
fn includes_splice_in_place_and_defaults_apply() {
    let tree = parse_fixture("include.inp").unwrap();

    assert_eq!(
        tree,
        json!({
            "+GLOBAL": {"PROJECT": "water"},
            "+FORCE_EVAL": {
                "_": "QS",
                "+SUBSYS": {
                    "+CELL": {
                        "ABC": [10.0, 10.0, 10.0],
                        "PERIODIC": "XYZ",
                    },
                },
            },
        })
    );
}

#[test]
fn initial_bindings_override_reference_defaults() {
    let tree = parse_fixture_with("include.inp", &[("BOX", "12.5")]).unwrap();

    assert_eq!(
        tree["+FORCE_EVAL"]["+SUBSYS"]["+CELL"]["ABC"],
        json!([12.5, 12.5, 12.5])
    );
}

#[test]
fn conditional_blocks_select_content() {
    let tree = parse_fixture("conditional.inp").unwrap();

    assert_eq!(tree, json!({"+GLOBAL": {"PROJECT": "gpw_run"}}));
}

#[test]
fn unterminated_section_is_rejected() {
    let err = parse_fixture("unterminated.inp").expect_err("must error");
    let InputError::Parser(ParserError::UnterminatedSection { name, .. }) = err else {
        panic!("unexpected error: {err:?}");
    };
    assert_eq!(name, "GLOBAL");
}

#[test]
fn missing_include_aborts_with_position() {
    init_tracing();

    let dir = inputs_dir();
    let schema = Schema::load_file(&dir.join("schema.json")).expect("schema fixture loads");

    let input = "&FORCE_EVAL\n&SUBSYS\n@INCLUDE \"no_such_file.inc\"\n&END\n&END\n";
    let preprocessor = Preprocessor::new(
        Box::new(std::io::Cursor::new(input.to_string())),
        "missing.inp",
        &dir,
    );

    let err = InputParser::new(&schema)
        .parse(preprocessor)
        .expect_err("must error");
    let InputError::Preprocessor(PreprocessorError::Include { path, ctx, .. }) = err else {
        panic!("unexpected error: {err:?}");
    };
    assert!(path.ends_with("no_such_file.inc"));
    assert_eq!(ctx.linenr, Some(3));
    assert_eq!(ctx.filename.as_deref(), Some(Path::new("missing.inp")));
}
