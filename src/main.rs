//! Quill - natural-language questions over a read-only SQLite database.

use anyhow::{Context, Result};
use std::io::{IsTerminal, Write};
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tracing::{error, info};

use db_quill::cli::{self, Cli, OutputFormat};
use db_quill::config::Config;
use db_quill::llm::{self, Gateway};
use db_quill::output::OutcomeOutput;
use db_quill::pipeline::{Pipeline, PipelineConfig, PipelineOutcome};
use db_quill::schema::SchemaText;
use db_quill::{db, logging};

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();
    logging::init(cli.log_file.as_deref());

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;

    // Environment fills what the file left unset; flags win over both.
    config.apply_env_defaults();
    cli.apply_overrides(&mut config)?;
    config.llm.require_api_key()?;

    let pipeline = build_pipeline(&config).await?;
    let output = OutcomeOutput::new(cli.output);

    if let Some(source) = &cli.batch {
        let input = read_batch_input(source).await?;
        let questions = cli::parse_batch(&input);
        info!(questions = questions.len(), concurrency = cli.concurrency(), "Running batch");

        let outcomes = pipeline.handle_batch(questions.as_slice(), cli.concurrency()).await;
        for (question, outcome) in questions.iter().zip(&outcomes) {
            if cli.output == OutputFormat::Text {
                println!("> {}", question);
            }
            print!("{}", separated(&output.format(question, outcome, true)));
            if cli.output == OutputFormat::Text {
                println!();
            }
        }
        return Ok(ExitCode::SUCCESS);
    }

    if let Some(question) = &cli.question {
        let outcome = pipeline.handle(question).await;
        print!("{}", separated(&output.format(question, &outcome, false)));
        return Ok(exit_code(&outcome));
    }

    interactive(&pipeline, &output).await?;
    Ok(ExitCode::SUCCESS)
}

/// Opens the database, loads the schema and wires the pipeline together.
async fn build_pipeline(config: &Config) -> Result<Pipeline> {
    let db = db::connect(&config.database)
        .await
        .with_context(|| format!("Failed to open {}", config.database.path.display()))?;

    let schema = SchemaText::load(&config.schema, db.as_ref())
        .await
        .context("Failed to load schema")?;

    let client = llm::create_client(&config.llm)?;
    let gateway = Gateway::from_config(client, &config.llm);

    info!(
        provider = %config.llm.provider,
        db = %config.database.path.display(),
        schema_chars = schema.len(),
        "Pipeline ready"
    );
    Ok(Pipeline::new(
        PipelineConfig::from_config(config),
        gateway,
        db,
        schema,
    ))
}

/// Reads questions line by line until EOF.
async fn interactive(pipeline: &Pipeline, output: &OutcomeOutput) -> Result<()> {
    let prompt = std::io::stdin().is_terminal();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        if prompt {
            print!("quill> ");
            std::io::stdout().flush()?;
        }

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }

        let outcome = pipeline.handle(question).await;
        println!("{}", output.format(question, &outcome, false).trim_end());
        if prompt {
            println!();
        }
    }

    Ok(())
}

async fn read_batch_input(source: &str) -> Result<String> {
    if source == "-" {
        let mut input = String::new();
        tokio::io::stdin()
            .read_to_string(&mut input)
            .await
            .context("Failed to read questions from stdin")?;
        return Ok(input);
    }

    tokio::fs::read_to_string(source)
        .await
        .with_context(|| format!("Failed to read batch file {}", source))
}

/// Ensures each rendered outcome ends with exactly one newline.
fn separated(rendered: &str) -> String {
    format!("{}\n", rendered.trim_end())
}

/// Failures exit non-zero; answers and rejections do not.
fn exit_code(outcome: &PipelineOutcome) -> ExitCode {
    match outcome {
        PipelineOutcome::Failed { error } if !error.is_rejection() => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    }
}
