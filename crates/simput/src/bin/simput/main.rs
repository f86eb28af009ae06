mod cli;

use simput::error::InputError;
use simput::parser::InputParser;
use simput::preprocessor::Preprocessor;
use simput::schema::Schema;
use simput::value::TreeValue;
use std::path::PathBuf;

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("SIMPUT_LOG"))
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!(
                    "Failed to resolve path for -C/--directory {}\n{}",
                    new_path.display(),
                    e
                );
                std::process::exit(1);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err,);
                    std::process::exit(1);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let command_result = match cli.command {
        cli::Command::Parse(parse_cli) => parse(parse_cli),
        cli::Command::Check(check_cli) => check(check_cli),
    };

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

fn parse(cli: cli::ParseCommand) -> anyhow::Result<()> {
    let tree = load_tree(&cli.input)?;

    match cli.format {
        cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), &tree)?,
        cli::OutputFormat::Json => serde_json::to_writer_pretty(std::io::stdout(), &tree)?,
    };

    Ok(())
}

fn check(cli: cli::CheckCommand) -> anyhow::Result<()> {
    let _ = load_tree(&cli.input)?;
    println!("{}: OK", cli.input.file.display());
    Ok(())
}

fn load_tree(input: &cli::InputArgs) -> anyhow::Result<TreeValue> {
    let schema = Schema::load_file(&input.schema)?;

    let base_dir = match &input.base_dir {
        Some(dir) => dir.clone(),
        None => input
            .file
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    let mut preprocessor = Preprocessor::from_path(&input.file, base_dir)?;
    for binding in &input.set {
        let Some((name, value)) = binding.split_once('=') else {
            anyhow::bail!("variable binding '{binding}' is not of the form NAME=VALUE");
        };
        preprocessor.define(name, value);
    }

    InputParser::new(&schema)
        .parse(preprocessor)
        .map_err(|e: InputError| {
            let position = e.context().clone();
            anyhow::Error::new(e).context(position)
        })
}
