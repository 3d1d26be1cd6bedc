mod cli;

use tfcascade::{Category, Combiner, Descriptor};

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("TFCASCADE_LOG"))
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
        cli::Command::Prep(prep_cli) => prep(prep_cli),
        cli::Command::Paths(paths_cli) => paths(paths_cli),
        cli::Command::Clean(clean_cli) => clean(clean_cli),
    };

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

fn load(environment: &cli::EnvironmentArgs) -> anyhow::Result<Descriptor> {
    let workdir = std::env::current_dir()?;
    Ok(Descriptor::load_in_tree(workdir, &environment.environment)?)
}

pub fn prep(cli: cli::PrepCommand) -> anyhow::Result<()> {
    let descriptor = load(&cli.environment)?;

    let mut combiner = Combiner::liquid()?;
    if let Some(seconds) = cli.timeout {
        combiner = combiner.with_timeout(std::time::Duration::from_secs(seconds));
    }

    if cli.categories.is_empty() {
        for path in combiner.combine_all(&descriptor)? {
            println!("{}", path.display());
        }
        return Ok(());
    }

    let mut failed: Vec<Category> = vec![];
    for (category, result) in combiner.combine_each(&descriptor, cli.categories) {
        match result {
            Ok(path) => println!("{}", path.display()),
            Err(err) => {
                eprintln!("{category}:");
                for error in anyhow::Error::new(err).chain() {
                    eprintln!("{error}")
                }
                failed.push(category);
            }
        }
    }

    anyhow::ensure!(failed.is_empty(), "Failed to combine {failed:?}");
    Ok(())
}

pub fn paths(cli: cli::PathsCommand) -> anyhow::Result<()> {
    let descriptor = load(&cli.environment)?;

    match cli.format {
        cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), &descriptor)?,
        cli::OutputFormat::Json => serde_json::to_writer_pretty(std::io::stdout(), &descriptor)?,
    };

    Ok(())
}

pub fn clean(cli: cli::CleanCommand) -> anyhow::Result<()> {
    let descriptor = load(&cli.environment)?;
    tfcascade::clean(&descriptor)?;
    Ok(())
}
