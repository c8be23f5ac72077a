//! Tests command - run a test suite on the server.

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use console::{Style, style};
use vigil_client::TestState;
use vigil_engine::tasks::test_suites::{self, TestSuiteOutcome, TestSuiteRun};
use vigil_types::StateType;

use super::{Context, print_json};

/// Arguments for the tests command.
#[derive(Args, Debug)]
pub struct TestsArgs {
    #[command(subcommand)]
    pub command: TestsCommand,
}

#[derive(Subcommand, Debug)]
pub enum TestsCommand {
    /// Run one test suite and report its test cases
    Run {
        /// Namespace holding the suite
        namespace: String,

        /// Test suite ID
        test_id: String,

        /// Only run this test case (repeatable)
        #[arg(long = "case", value_name = "TEST_CASE")]
        cases: Vec<String>,

        /// Exit with an error when test cases fail, not only when they error
        #[arg(long)]
        fail_on_test_failure: bool,
    },
}

/// Run the tests command.
pub async fn run(args: TestsArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;

    match args.command {
        TestsCommand::Run {
            namespace,
            test_id,
            cases,
            fail_on_test_failure,
        } => {
            let request = TestSuiteRun {
                namespace,
                test_id,
                test_cases: cases,
                fail_on_test_failure,
            };
            let outcome = test_suites::run(&client, &request).await?;

            if ctx.json_output {
                print_json(&outcome)?;
            } else {
                print_outcome(&outcome);
            }

            if outcome.state_override == Some(StateType::Failed) {
                bail!(
                    "test suite {}.{} ended with {}",
                    request.namespace.trim(),
                    request.test_id.trim(),
                    outcome.result.state
                );
            }
        }
    }

    Ok(())
}

fn state_style(state: TestState) -> Style {
    match state {
        TestState::Success => Style::new().green(),
        TestState::Failed | TestState::Skipped => Style::new().yellow(),
        TestState::Error => Style::new().red(),
    }
}

fn print_outcome(outcome: &TestSuiteOutcome) {
    let dim = Style::new().dim();
    let result = &outcome.result;

    println!();
    println!(
        "{} {}",
        style("Test Suite").bold(),
        state_style(result.state).apply_to(result.state)
    );
    println!("{}", dim.apply_to("─".repeat(40)));

    for case in &result.results {
        println!(
            "  {} {} {}",
            state_style(case.state).apply_to("●"),
            case.test_id,
            dim.apply_to(case.execution_id.as_deref().unwrap_or(""))
        );
        for error in &case.errors {
            println!("      {}", Style::new().red().apply_to(&error.message));
        }
    }
    println!();
}
