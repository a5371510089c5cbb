//! varflow CLI - formula evaluation tool

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use varflow::{parse_formula, tokenize, Engine};

#[derive(Parser)]
#[command(name = "varflow")]
#[command(author, version, about = "Evaluate and inspect varflow formulas")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a formula, with variables bound on the command line
    Eval {
        /// Formula text, e.g. "sqrt(x ^ 2 + y ^ 2)"
        formula: String,

        /// Variable binding as name=value (repeatable)
        #[arg(short, long = "var", value_name = "NAME=VALUE")]
        var: Vec<String>,
    },

    /// Show the token stream and expression tree of a formula
    Inspect {
        /// Formula text
        formula: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Eval { formula, var } => eval(&formula, &var),
        Commands::Inspect { formula } => inspect(&formula),
    }
}

fn eval(formula: &str, bindings: &[String]) -> Result<()> {
    let mut engine = Engine::new();

    for binding in bindings {
        let (name, value) = parse_binding(binding)?;
        engine
            .define_input(name, value)
            .with_context(|| format!("Failed to bind variable '{name}'"))?;
    }

    let value = engine
        .evaluate(formula)
        .with_context(|| format!("Failed to evaluate '{formula}'"))?;

    println!("{value}");
    Ok(())
}

fn inspect(formula: &str) -> Result<()> {
    let tokens = tokenize(formula).context("Failed to tokenize formula")?;

    println!("Tokens:");
    for token in &tokens {
        println!("  {:>3}  {}", token.position, token.kind);
    }

    let parsed = parse_formula(formula).context("Failed to parse formula")?;

    println!("\nExpression tree:\n{:#?}", parsed.expr);

    if parsed.variables.is_empty() {
        println!("\nNo referenced variables");
    } else {
        let names: Vec<_> = parsed.variables.iter().cloned().collect();
        println!("\nReferenced variables: {}", names.join(", "));
    }
    Ok(())
}

fn parse_binding(binding: &str) -> Result<(&str, f64)> {
    let Some((name, value)) = binding.split_once('=') else {
        bail!("Invalid variable binding '{binding}': expected name=value");
    };
    let name = name.trim();
    if !is_valid_name(name) {
        bail!(
            "Invalid variable name '{name}': names start with a letter or \
             underscore, followed by letters, digits or underscores"
        );
    }
    let value: f64 = value
        .trim()
        .parse()
        .with_context(|| format!("Invalid numeric value in binding '{binding}'"))?;
    Ok((name, value))
}

/// A name formulas can actually reference: identifier syntax only
fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .map_or(false, |c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_binding() {
        assert_eq!(parse_binding("x=1.5").unwrap(), ("x", 1.5));
        assert_eq!(parse_binding(" rate_2 = -3 ").unwrap(), ("rate_2", -3.0));
        assert!(parse_binding("x").is_err());
        assert!(parse_binding("x=abc").is_err());
    }

    #[test]
    fn test_parse_binding_rejects_unreferencable_names() {
        assert!(parse_binding("2x=1").is_err());
        assert!(parse_binding("=1").is_err());
        assert!(parse_binding("a b=1").is_err());
    }
}
