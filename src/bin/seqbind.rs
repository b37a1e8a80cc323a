use seqbind::{generate, init_logging, load_model, Config};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, error, info, Level};

#[derive(Debug)]
struct Args {
    model: PathBuf,
    config: Option<PathBuf>,
    out: Option<PathBuf>,
    java_pkg: Option<String>,
    verbose: bool,
}

impl Args {
    fn from_args() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().collect();
        let prog = args.first().map_or("seqbind", String::as_str);

        let mut model = None;
        let mut config = None;
        let mut out = None;
        let mut java_pkg = None;
        let mut verbose = false;

        let mut rest = args.iter().skip(1);
        while let Some(arg) = rest.next() {
            match arg.as_str() {
                "--help" | "-h" => return Err(Self::usage(prog)),
                "--verbose" | "-v" => verbose = true,
                "--config" => config = Some(PathBuf::from(Self::value(&mut rest, arg, prog)?)),
                "--out" | "-o" => out = Some(PathBuf::from(Self::value(&mut rest, arg, prog)?)),
                "--java-pkg" => java_pkg = Some(Self::value(&mut rest, arg, prog)?),
                path if !path.starts_with('-') => {
                    if model.replace(PathBuf::from(path)).is_some() {
                        return Err(format!("Only one model file may be given\n\n{}", Self::usage(prog)));
                    }
                }
                opt => return Err(format!("Unknown option: {}\n\n{}", opt, Self::usage(prog))),
            }
        }

        let model = model.ok_or_else(|| format!("No model file specified\n\n{}", Self::usage(prog)))?;
        Ok(Self {
            model,
            config,
            out,
            java_pkg,
            verbose,
        })
    }

    fn value<'a>(rest: &mut impl Iterator<Item = &'a String>, flag: &str, prog: &str) -> Result<String, String> {
        rest.next()
            .cloned()
            .ok_or_else(|| format!("{} requires a value\n\n{}", flag, Self::usage(prog)))
    }

    fn usage(prog: &str) -> String {
        format!(
            "seqbind - generate Java/JNI and Objective-C bindings\n\n\
            USAGE:\n    {} [OPTIONS] <MODEL.json>\n\n\
            OPTIONS:\n    \
            -h, --help          Print help information\n    \
            --config <FILE>     Use FILE instead of the nearest seqbind.toml\n    \
            -o, --out <DIR>     Output directory\n    \
            --java-pkg <PKG>    Package prefix for implemented class names\n    \
            -v, --verbose       Debug logging\n\n\
            EXAMPLES:\n    \
            {} classes.json\n    \
            {} --out gen/java --java-pkg com.example classes.json",
            prog, prog, prog
        )
    }
}

fn run(args: &Args, config: &Config) -> seqbind::Result<usize> {
    let model = load_model(&args.model, &config.generator.model_options())?;
    let output = generate(&model, &config.generator.codegen_options());

    let dir = &config.output.dir;
    if config.output.clean && dir.exists() {
        debug!(dir = %dir.display(), "Removing previous output");
        fs::remove_dir_all(dir).map_err(|source| seqbind::BindError::Write {
            path: dir.clone(),
            source,
        })?;
    }
    output.write_to(dir)?;
    Ok(output.len())
}

fn main() {
    let args = match Args::from_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    let loaded = match &args.config {
        Some(path) => Config::load(path),
        None => Config::discover(),
    };
    let mut config = match loaded {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(out) = &args.out {
        config.output.dir = out.clone();
    }
    if let Some(pkg) = &args.java_pkg {
        config.generator.java_pkg = pkg.clone();
    }

    let mut log_config = config.logging.to_log_config();
    if args.verbose {
        log_config = log_config.with_level(Level::DEBUG);
    }
    let _guard = init_logging(log_config);

    debug!(args = ?args, "Configuration loaded");

    match run(&args, &config) {
        Ok(files) => {
            info!(files, dir = %config.output.dir.display(), "Bindings written");
            println!("Wrote {} files to {}", files, config.output.dir.display());
        }
        Err(e) => {
            error!(error = %e, "Generation failed");
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
