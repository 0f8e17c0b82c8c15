use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use scenario_expression::{
    load, to_boolean, validate, ConditionRegistry, Expression, Literal, ParseOptions,
};
use serde_json::json;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Maximum nesting depth of a condition document
    #[arg(long, global = true)]
    max_depth: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the parsed tree of a condition file
    Parse {
        /// Path to the condition file
        #[arg(short, long)]
        file: String,
    },
    /// Evaluate a condition file against assumed condition results
    ///
    /// Exits with 0 when the condition holds, 1 when it does not, and 2 when
    /// the file cannot be parsed or evaluated.
    Evaluate {
        /// Path to the condition file
        #[arg(short, long)]
        file: String,

        /// Result of a named condition, as NAME=VALUE (VALUE is a boolean or number)
        #[arg(short, long = "assume", value_parser = parse_assumption)]
        assumptions: Vec<Assumption>,

        /// Fail before evaluating if any named condition has no assumption
        #[arg(long)]
        strict: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone)]
struct Assumption {
    name: String,
    value: Literal,
}

fn parse_assumption(raw: &str) -> Result<Assumption, String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", raw))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing condition name in '{}'", raw));
    }

    let value = match value.trim() {
        "true" => Literal::Boolean(true),
        "false" => Literal::Boolean(false),
        other => other
            .parse::<f64>()
            .map(Literal::Number)
            .map_err(|_| format!("'{}' is neither a boolean nor a number", other))?,
    };

    Ok(Assumption {
        name: name.to_string(),
        value,
    })
}

/// Exit status when the condition holds, or a non-evaluating command succeeds
const EXIT_HOLDS: i32 = 0;
/// Exit status when the condition evaluated to false
const EXIT_DOES_NOT_HOLD: i32 = 1;
/// Exit status when the condition could not be parsed or evaluated
const EXIT_ERROR: i32 = 2;

/// Result of a successful command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Done,
    Evaluated { holds: bool },
}

fn exit_code(outcome: &anyhow::Result<Outcome>) -> i32 {
    match outcome {
        Ok(Outcome::Done) | Ok(Outcome::Evaluated { holds: true }) => EXIT_HOLDS,
        Ok(Outcome::Evaluated { holds: false }) => EXIT_DOES_NOT_HOLD,
        Err(_) => EXIT_ERROR,
    }
}

struct Evaluation {
    condition: Expression,
    result: Expression,
    holds: bool,
}

fn evaluate_file(
    file: &str,
    assumptions: Vec<Assumption>,
    strict: bool,
    options: ParseOptions,
) -> anyhow::Result<Evaluation> {
    let condition = load(file, options)
        .with_context(|| format!("Failed to parse condition file {}", file))?;

    let registry = ConditionRegistry::new();
    for Assumption { name, value } in assumptions {
        log::info!("Assuming {} = {}", name, value);
        registry.register_fn(name, move |_| Ok(value));
    }

    if strict {
        validate(&condition, &registry).context("Condition file references unknown checks")?;
    }

    let result = condition
        .evaluate(&registry)
        .with_context(|| format!("Failed to evaluate {}", file))?;
    let holds = to_boolean(&result)?;

    Ok(Evaluation {
        condition,
        result,
        holds,
    })
}

fn run(args: Args) -> anyhow::Result<Outcome> {
    let mut options = ParseOptions::from_env();
    if let Some(max_depth) = args.max_depth {
        options.max_depth = max_depth;
    }

    match args.command {
        Commands::Parse { file } => {
            let expr = load(&file, options)
                .with_context(|| format!("Failed to parse condition file {}", file))?;
            println!("{}", expr);
            Ok(Outcome::Done)
        }
        Commands::Evaluate {
            file,
            assumptions,
            strict,
            json,
        } => {
            let evaluation = evaluate_file(&file, assumptions, strict, options)?;

            if json {
                let report = json!({
                    "condition": evaluation.condition.to_string(),
                    "result": evaluation.result.as_literal(),
                    "holds": evaluation.holds,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", evaluation.result);
            }

            Ok(Outcome::Evaluated {
                holds: evaluation.holds,
            })
        }
    }
}

fn main() {
    dotenv().ok();
    env_logger::init();

    let outcome = run(Args::parse());
    if let Err(err) = &outcome {
        eprintln!("Error: {:?}", err);
    }
    std::process::exit(exit_code(&outcome));
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenario_expression::ExpressionError;

    #[test]
    fn test_parse_assumption() {
        let assumption = parse_assumption("always_true=true").unwrap();
        assert_eq!(assumption.name, "always_true");
        assert_eq!(assumption.value, Literal::Boolean(true));

        let assumption = parse_assumption(" speed = 12.5 ").unwrap();
        assert_eq!(assumption.name, "speed");
        assert_eq!(assumption.value, Literal::Number(12.5));
    }

    #[test]
    fn test_parse_assumption_invalid() {
        assert!(parse_assumption("no_value").is_err());
        assert!(parse_assumption("=true").is_err());
        assert!(parse_assumption("speed=fast").is_err());
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "scenario-expression",
            "evaluate",
            "--file",
            "condition.yaml",
            "--assume",
            "a=true",
            "-a",
            "b=2",
            "--json",
        ])
        .unwrap();

        match args.command {
            Commands::Evaluate {
                file,
                assumptions,
                strict,
                json,
            } => {
                assert_eq!(file, "condition.yaml");
                assert_eq!(assumptions.len(), 2);
                assert!(!strict);
                assert!(json);
            }
            other => panic!("Expected evaluate command, got {:?}", other),
        }
    }

    fn write_condition(name: &str, yaml: &str) -> std::path::PathBuf {
        let file_name = format!("scenario-expression-{}-{}.yaml", std::process::id(), name);
        let path = std::env::temp_dir().join(file_name);
        std::fs::write(&path, yaml).unwrap();
        path
    }

    fn evaluate_yaml(name: &str, yaml: &str, assumptions: &[&str]) -> anyhow::Result<Outcome> {
        let path = write_condition(name, yaml);
        let assumptions = assumptions
            .iter()
            .map(|raw| parse_assumption(raw).unwrap())
            .collect();
        let evaluation = evaluate_file(
            path.to_str().unwrap(),
            assumptions,
            false,
            ParseOptions::default(),
        );
        std::fs::remove_file(&path).ok();
        evaluation.map(|evaluation| Outcome::Evaluated {
            holds: evaluation.holds,
        })
    }

    #[test]
    fn test_exit_code_mapping() {
        assert_eq!(exit_code(&Ok(Outcome::Done)), EXIT_HOLDS);
        assert_eq!(
            exit_code(&Ok(Outcome::Evaluated { holds: true })),
            EXIT_HOLDS
        );
        assert_eq!(
            exit_code(&Ok(Outcome::Evaluated { holds: false })),
            EXIT_DOES_NOT_HOLD
        );
        assert_eq!(exit_code(&Err(anyhow::anyhow!("boom"))), EXIT_ERROR);
        assert_ne!(EXIT_DOES_NOT_HOLD, EXIT_ERROR);
    }

    #[test]
    fn test_evaluate_holds() {
        let outcome = evaluate_yaml(
            "holds",
            "All: [true, {Type: always_true}]",
            &["always_true=true"],
        );
        assert_eq!(exit_code(&outcome), EXIT_HOLDS);
    }

    #[test]
    fn test_evaluate_does_not_hold() {
        let outcome = evaluate_yaml("does-not-hold", "All: [false]", &[]);
        assert_eq!(outcome.unwrap(), Outcome::Evaluated { holds: false });
    }

    #[test]
    fn test_evaluate_unresolved_is_error_not_false() {
        let outcome = evaluate_yaml("unresolved", "All: [true, {Type: missing}]", &[]);
        assert_eq!(exit_code(&outcome), EXIT_ERROR);

        let err = outcome.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExpressionError>(),
            Some(ExpressionError::Resolution { .. })
        ));
    }

    #[test]
    fn test_evaluate_parse_error_is_error() {
        let outcome = evaluate_yaml("malformed", "Whenever: [true]", &[]);
        assert_eq!(exit_code(&outcome), EXIT_ERROR);
    }

    #[test]
    fn test_evaluate_missing_file_is_error() {
        let outcome = evaluate_file(
            "/nonexistent/condition.yaml",
            vec![],
            false,
            ParseOptions::default(),
        )
        .map(|_| Outcome::Done);
        assert_eq!(exit_code(&outcome), EXIT_ERROR);
    }
}
