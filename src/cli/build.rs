//! Build command implementations (pack, build, watch, clean, modules)

use std::fs;
use std::process::ExitCode;

use super::{EXIT_ERROR, EXIT_SUCCESS};
use crate::build::{
    resolve, Assembler, BuildConfig, BuildContext, BuildPipeline, LanguageRequest,
    ModuleRegistry,
};
use crate::watch::{watch_and_rebuild, WatchOptions};

/// Run the pack command: compile only the primary entry.
pub fn run_pack(context: BuildContext, config: &BuildConfig, dry_run: bool) -> ExitCode {
    let config = config.clone().with_languages(None);
    let toolchain = context.toolchain();
    let assembler = Assembler::new(&context, toolchain.as_ref());

    if dry_run {
        let (path, variant) = assembler.destination(&config);
        println!("Dry run - would pack:");
        println!("  Entry: {}", context.entry_path().display());
        println!("  Output: {} ({})", path.display(), variant);
        return ExitCode::from(EXIT_SUCCESS);
    }

    match assembler.pack(&config) {
        Ok(artifact) => {
            println!("{}", artifact.summary());
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Run the build command: pack plus the requested modules, minified.
///
/// Without `--languages` every module is bundled.
pub fn run_build(context: BuildContext, config: &BuildConfig, dry_run: bool) -> ExitCode {
    let config = config.for_custom_build();
    let pipeline = BuildPipeline::new(context).with_dry_run(dry_run);

    if pipeline.is_dry_run() {
        return match pipeline.plan(&config) {
            Ok(plan) => {
                println!("Dry run - {}", plan.summary());
                ExitCode::from(EXIT_SUCCESS)
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::from(EXIT_ERROR)
            }
        };
    }

    match pipeline.run(&config) {
        Ok(artifact) => {
            println!("{}", artifact.summary());
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Run the watch command: rebuild on every source change.
pub fn run_watch(context: BuildContext, config: &BuildConfig) -> ExitCode {
    let options = WatchOptions {
        src_dir: context.src_dir(),
        config: context.config().watch.clone(),
        verbose: context.is_verbose(),
    };
    let pipeline = BuildPipeline::new(context);

    println!("Starting watch mode...");
    println!("Press Ctrl+C to stop");
    println!();

    match watch_and_rebuild(options, || pipeline.run(config)) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("Watch error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Run the clean command: remove the output directory.
pub fn run_clean(context: &BuildContext) -> ExitCode {
    let out_dir = context.out_dir();
    if !out_dir.exists() {
        println!("Nothing to clean: {} does not exist", out_dir.display());
        return ExitCode::from(EXIT_SUCCESS);
    }

    match fs::remove_dir_all(&out_dir) {
        Ok(()) => {
            println!("Removed {}", out_dir.display());
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: failed to remove {}: {}", out_dir.display(), e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Run the modules command.
///
/// Lists every module with its base dependency, or with `--languages` the
/// resolved load order.
pub fn run_modules(context: &BuildContext, languages: Option<&LanguageRequest>) -> ExitCode {
    let registry = context.registry();

    if let Some(request) = languages {
        return match resolve(&registry, request) {
            Ok(set) => {
                for id in &set {
                    println!("{}", id);
                }
                ExitCode::from(EXIT_SUCCESS)
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::from(EXIT_ERROR)
            }
        };
    }

    let modules = match registry.list_all() {
        Ok(modules) => modules,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let base = registry.base();
    if registry.has_base() {
        println!("{} (base)", base.id);
    } else {
        eprintln!("Warning: base module '{}' not found at {}", base.id, base.path.display());
    }
    for module in &modules {
        if module.requires_base {
            println!("{} (needs {})", module.id, base.id);
        } else {
            println!("{}", module.id);
        }
    }
    ExitCode::from(EXIT_SUCCESS)
}
