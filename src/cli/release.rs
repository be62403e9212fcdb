//! Release command implementations (release, test)

use std::process::ExitCode;

use super::{EXIT_ERROR, EXIT_SUCCESS};
use crate::build::{BuildConfig, BuildContext};
use crate::release::{Collaborators, CommandVerifier, GitCli, ReleaseOrchestrator, Verifier};
use crate::version::ReleaseType;

fn verifier(context: &BuildContext, watch: bool) -> CommandVerifier {
    CommandVerifier::from_config(&context.config().verify, context.verify_config_path())
        .with_watch(watch)
        .with_work_dir(context.project_root())
}

/// Run the release command.
pub fn run_release(
    context: &BuildContext,
    config: &BuildConfig,
    release_type: ReleaseType,
    dry_run: bool,
) -> ExitCode {
    let verifier = verifier(context, false);
    let vcs = GitCli::new(context.project_root());
    let record = context.version_record();
    let toolchain = context.toolchain();
    let collaborators = Collaborators {
        verifier: &verifier,
        vcs: &vcs,
        record: record.as_ref(),
        toolchain: toolchain.as_ref(),
    };

    let mut orchestrator = ReleaseOrchestrator::new(context, release_type, collaborators)
        .with_build_config(config.clone())
        .with_dry_run(dry_run);

    match orchestrator.run() {
        Ok(report) => {
            println!("{}", report.summary());
            if context.is_verbose() {
                let phases: Vec<_> = report.phases.iter().map(|p| p.to_string()).collect();
                println!("  Phases: {}", phases.join(" -> "));
            }
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Run the test command.
pub fn run_test(context: &BuildContext, watch: bool) -> ExitCode {
    match verifier(context, watch).verify() {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("Error: tests failed: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
