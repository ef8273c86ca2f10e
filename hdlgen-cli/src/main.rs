//! hdlgen CLI - AI-assisted HDL generation from the command line.

use clap::{Args, Parser, Subcommand, ValueEnum};
use hdlgen::ai::{GenerationParams, ProviderConfig, ProviderRegistry};
use hdlgen::{AppConfig, GenerationOutcome, GenerationRequest, HdlPipeline};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "hdlgen")]
#[command(about = "Generate, compile, and package HDL circuits", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to a JSON configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a circuit from a natural-language description
    Generate {
        /// Circuit description, e.g. "a 4-bit counter with enable"
        #[arg(value_name = "PROMPT", required_unless_present = "prompt_file")]
        prompt: Option<String>,

        /// Read the circuit description from a file instead
        #[arg(long, value_name = "FILE", conflicts_with = "prompt")]
        prompt_file: Option<PathBuf>,

        /// Name for the generated circuit (becomes the top-level unit)
        #[arg(short, long)]
        name: String,

        /// Directory the archive is written to (overrides configuration)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        #[command(flatten)]
        provider: ProviderArgs,

        /// Sampling temperature override (0-2)
        #[arg(long)]
        temperature: Option<f32>,

        /// Token budget override (1-8000)
        #[arg(long)]
        max_tokens: Option<u32>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Compile and package an existing HDL file
    Package {
        /// Path to a .vhdl or .v source file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Name for the packaged circuit (defaults to the file stem)
        #[arg(short, long)]
        name: Option<String>,

        /// Directory the archive is written to (overrides configuration)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// List available AI providers
    Providers {
        /// Show required and optional configuration per provider
        #[arg(short, long)]
        verbose: bool,
    },

    /// Check connectivity against a provider
    TestProvider {
        #[command(flatten)]
        provider: ProviderArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },
}

#[derive(Args)]
struct ProviderArgs {
    /// Provider key: azure_openai, openai, or gemini (aliases accepted)
    #[arg(short, long, env = "HDLGEN_PROVIDER")]
    provider: String,

    /// API key for the provider
    #[arg(long, env = "HDLGEN_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Model name, e.g. gpt-4o or gemini-1.5-flash
    #[arg(short, long, env = "HDLGEN_MODEL")]
    model: Option<String>,

    /// API endpoint (required for Azure, optional elsewhere)
    #[arg(long, env = "HDLGEN_ENDPOINT")]
    endpoint: Option<String>,

    /// API version (Azure only)
    #[arg(long, env = "HDLGEN_API_VERSION")]
    api_version: Option<String>,

    /// Deployment name (Azure only)
    #[arg(long, env = "HDLGEN_DEPLOYMENT")]
    deployment: Option<String>,
}

impl ProviderArgs {
    fn into_config(self) -> ProviderConfig {
        ProviderConfig {
            provider_type: self.provider,
            api_key: self.api_key,
            model_name: self.model,
            endpoint: self.endpoint,
            api_version: self.api_version,
            deployment_name: self.deployment,
            temperature: 0.7,
            max_tokens: 2000,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for scripting
    Json,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let exit_code = match cli.command {
        Commands::Generate {
            prompt,
            prompt_file,
            name,
            output,
            provider,
            temperature,
            max_tokens,
            format,
        } => {
            let mut config = config;
            if let Some(dir) = output {
                config.export.export_directory = dir;
            }
            let prompt = match resolve_prompt(prompt, prompt_file) {
                Ok(prompt) => prompt,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    process::exit(1);
                }
            };
            handle_generate(config, prompt, name, provider, temperature, max_tokens, format).await
        }
        Commands::Package {
            file,
            name,
            output,
            format,
        } => {
            let mut config = config;
            if let Some(dir) = output {
                config.export.export_directory = dir;
            }
            handle_package(config, file, name, format).await
        }
        Commands::Providers { verbose } => {
            handle_providers(verbose);
            0
        }
        Commands::TestProvider { provider, format } => handle_test_provider(provider, format).await,
    };

    process::exit(exit_code);
}

fn resolve_prompt(
    prompt: Option<String>,
    prompt_file: Option<PathBuf>,
) -> std::io::Result<String> {
    match (prompt, prompt_file) {
        (Some(prompt), _) => Ok(prompt),
        (None, Some(path)) => Ok(std::fs::read_to_string(path)?.trim().to_string()),
        // clap's required_unless_present rules this out.
        (None, None) => Ok(String::new()),
    }
}

async fn handle_generate(
    config: AppConfig,
    prompt: String,
    name: String,
    provider: ProviderArgs,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    format: OutputFormat,
) -> i32 {
    let pipeline = HdlPipeline::new(config);
    let request = GenerationRequest {
        prompt,
        circuit_name: name,
        provider: provider.into_config(),
        params: GenerationParams {
            temperature,
            max_tokens,
            top_p: None,
        },
    };

    match pipeline.generate(&request).await {
        Ok(outcome) => {
            output_outcome(&outcome, &format);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

async fn handle_package(
    config: AppConfig,
    file: PathBuf,
    name: Option<String>,
    format: OutputFormat,
) -> i32 {
    let circuit_name = match name.or_else(|| {
        file.file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.to_string())
    }) {
        Some(name) => name,
        None => {
            eprintln!("Error: cannot derive a circuit name from {}", file.display());
            return 1;
        }
    };

    let source = match std::fs::read_to_string(&file) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error: failed to read {}: {}", file.display(), e);
            return 1;
        }
    };

    let pipeline = HdlPipeline::new(config);
    match pipeline.process_source(&source, &circuit_name).await {
        Ok(outcome) => {
            output_outcome(&outcome, &format);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn handle_providers(verbose: bool) {
    let registry = ProviderRegistry::with_default_providers();
    let template = ProviderConfig {
        provider_type: String::new(),
        api_key: String::new(),
        model_name: None,
        endpoint: None,
        api_version: None,
        deployment_name: None,
        temperature: 0.7,
        max_tokens: 2000,
    };

    println!("Available providers:\n");
    for info in registry.provider_infos(&template) {
        println!("  {}", info.provider_type);
        println!("    {}", info.description);
        if verbose {
            println!("    Models:   {}", info.supported_models.join(", "));
            println!("    Required: {}", info.required_config.join(", "));
            if !info.optional_config.is_empty() {
                println!("    Optional: {}", info.optional_config.join(", "));
            }
        }
        println!();
    }
}

async fn handle_test_provider(provider: ProviderArgs, format: OutputFormat) -> i32 {
    let registry = ProviderRegistry::with_default_providers();
    let status = registry.test_connection(&provider.into_config()).await;

    match format {
        OutputFormat::Human => {
            if status.success {
                println!("Connection to {} succeeded", status.provider);
                if let Some(model) = &status.model {
                    println!("  Model: {}", model);
                }
                if let Some(seconds) = status.response_time {
                    println!("  Response time: {:.2}s", seconds);
                }
            } else {
                println!("Connection to {} failed", status.provider);
                println!("  {}", status.message);
            }
        }
        OutputFormat::Json => match serde_json::to_string_pretty(&status) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        },
    }

    if status.success {
        0
    } else {
        1
    }
}

fn output_outcome(outcome: &GenerationOutcome, format: &OutputFormat) {
    match format {
        OutputFormat::Human => {
            println!("Circuit:  {}", outcome.parsed.entity_name);
            println!("Language: {}", outcome.parsed.language);
            println!("Provider: {} ({})", outcome.provider, outcome.model);
            println!(
                "Compile:  {}",
                if outcome.compilation.success {
                    "success"
                } else {
                    "FAILED"
                }
            );
            if let Some(error) = &outcome.compilation.error_message {
                println!("\n{}", error.trim_end());
            }
            for warning in &outcome.compilation.warnings {
                println!("\nwarning: {}", warning.trim_end());
            }
            println!("\nArchive:  {}", outcome.export.archive_path.display());
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "circuit": outcome.parsed.entity_name,
                "language": outcome.parsed.language,
                "provider": outcome.provider,
                "model": outcome.model,
                "compilation": {
                    "success": outcome.compilation.success,
                    "error": outcome.compilation.error_message,
                    "warnings": outcome.compilation.warnings,
                    "time_ms": outcome.compilation.compilation_time.as_millis() as u64,
                },
                "metadata": outcome.parsed.metadata,
                "archive": outcome.export.archive_path.display().to_string(),
                "members": outcome.export.members,
            });
            match serde_json::to_string_pretty(&json) {
                Ok(text) => println!("{}", text),
                Err(e) => eprintln!("Error: {}", e),
            }
        }
    }
}
