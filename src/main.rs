use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

use climaseguro::config::Config;
use climaseguro::funds;
use climaseguro::logging::{self, LogTarget};
use climaseguro::models::FormInput;
use climaseguro::storage::UploadedFile;
use climaseguro::{export, PipelineError, ProcessService};

#[derive(Debug, PartialEq)]
enum Command {
    Funds,
    Create {
        zone_id: Option<i64>,
        context: Option<String>,
    },
    Context {
        process_id: i64,
    },
    SetContext {
        process_id: i64,
        patch: String,
    },
    Upload {
        process_id: i64,
        files: Vec<PathBuf>,
    },
    Form {
        process_id: i64,
        input: FormInput,
    },
    Preflight {
        process_id: i64,
        fund: String,
    },
    Generate {
        process_id: i64,
        fund: String,
    },
    Documents {
        process_id: i64,
    },
    Open {
        document_id: i64,
        output: Option<PathBuf>,
    },
    Export {
        process_id: i64,
        output: PathBuf,
    },
    ResetDb,
}

struct Cli {
    config_path: Option<PathBuf>,
    log_stderr: bool,
    command: Command,
}

fn parse_args() -> Cli {
    let args: Vec<String> = std::env::args().collect();
    let mut config_path = None;
    let mut log_stderr = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("climaseguro {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                } else {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                }
            }
            "--log-stderr" => log_stderr = true,
            _ => break,
        }
        i += 1;
    }

    match parse_command(&args[i.min(args.len())..]) {
        Ok(command) => Cli {
            config_path,
            log_stderr,
            command,
        },
        Err(message) => {
            eprintln!("Error: {}", message);
            print_help();
            std::process::exit(1);
        }
    }
}

fn parse_id(value: Option<&String>, what: &str) -> Result<i64, String> {
    let value = value.ok_or_else(|| format!("missing {}", what))?;
    value
        .parse()
        .map_err(|_| format!("invalid {}: {}", what, value))
}

fn parse_text(value: Option<&String>, what: &str) -> Result<String, String> {
    value.cloned().ok_or_else(|| format!("missing {}", what))
}

fn parse_command(args: &[String]) -> Result<Command, String> {
    let Some(name) = args.first() else {
        return Err("missing command".to_string());
    };
    let rest = &args[1..];

    let command = match name.as_str() {
        "funds" => Command::Funds,
        "create" => {
            let mut zone_id = None;
            let mut context = None;
            let mut j = 0;
            while j < rest.len() {
                match rest[j].as_str() {
                    "--zone" => {
                        zone_id = Some(parse_id(rest.get(j + 1), "zone id")?);
                        j += 1;
                    }
                    "--context" => {
                        context = Some(parse_text(rest.get(j + 1), "context JSON")?);
                        j += 1;
                    }
                    other => return Err(format!("unknown option for create: {}", other)),
                }
                j += 1;
            }
            Command::Create { zone_id, context }
        }
        "context" => Command::Context {
            process_id: parse_id(rest.first(), "process id")?,
        },
        "set-context" => Command::SetContext {
            process_id: parse_id(rest.first(), "process id")?,
            patch: parse_text(rest.get(1), "context JSON")?,
        },
        "upload" => {
            let process_id = parse_id(rest.first(), "process id")?;
            let files: Vec<PathBuf> = rest[1.min(rest.len())..].iter().map(PathBuf::from).collect();
            if files.is_empty() {
                return Err("upload needs at least one file".to_string());
            }
            Command::Upload { process_id, files }
        }
        "form" => {
            let process_id = parse_id(rest.first(), "process id")?;
            let mut input = FormInput {
                responsavel: parse_text(rest.get(1), "responsavel")?,
                data_vistoria: parse_text(rest.get(2), "data_vistoria")?,
                ..Default::default()
            };
            let mut j = 3;
            while j < rest.len() {
                match rest[j].as_str() {
                    "--observacoes" => {
                        input.observacoes = parse_text(rest.get(j + 1), "observacoes")?;
                        j += 1;
                    }
                    "--acao" => {
                        input.acao_imediata = parse_text(rest.get(j + 1), "acao_imediata")?;
                        j += 1;
                    }
                    other => return Err(format!("unknown option for form: {}", other)),
                }
                j += 1;
            }
            Command::Form { process_id, input }
        }
        "preflight" => Command::Preflight {
            process_id: parse_id(rest.first(), "process id")?,
            fund: parse_text(rest.get(1), "fund code")?,
        },
        "generate" => Command::Generate {
            process_id: parse_id(rest.first(), "process id")?,
            fund: parse_text(rest.get(1), "fund code")?,
        },
        "documents" => Command::Documents {
            process_id: parse_id(rest.first(), "process id")?,
        },
        "open" => {
            let document_id = parse_id(rest.first(), "document id")?;
            let output = match rest.get(1).map(String::as_str) {
                Some("--output") | Some("-o") => {
                    Some(PathBuf::from(parse_text(rest.get(2), "output path")?))
                }
                Some(other) => return Err(format!("unknown option for open: {}", other)),
                None => None,
            };
            Command::Open {
                document_id,
                output,
            }
        }
        "export" => Command::Export {
            process_id: parse_id(rest.first(), "process id")?,
            output: PathBuf::from(parse_text(rest.get(1), "output path")?),
        },
        "reset-db" => Command::ResetDb,
        other => return Err(format!("unknown command: {}", other)),
    };

    Ok(command)
}

fn print_help() {
    println!(
        r#"climaseguro - prevention process intake and fund document generation

USAGE:
    climaseguro [OPTIONS] <COMMAND> [ARGS]

COMMANDS:
    funds                                   List supported funds
    create [--zone ID] [--context JSON]     Create a prevention process
    context PROCESS                         Show the consolidated context
    set-context PROCESS JSON                Merge a JSON object into the stored context
    upload PROCESS FILE...                  Upload inspection photos
    form PROCESS RESPONSAVEL DATA [--observacoes TEXT] [--acao TEXT]
                                            Submit the inspection form
    preflight PROCESS FUND                  Report missing fields per document
    generate PROCESS FUND                   Generate the documents a fund requires
    documents PROCESS                       List generated documents
    open DOCUMENT [--output PATH]           Copy a generated document out
    export PROCESS PATH                     Write the process dossier as JSON
    reset-db                                Drop and recreate all tables

OPTIONS:
    --config, -c PATH   Path to config file
    --log-stderr        Log to stderr instead of journald/log file
    --version, -V       Show version
    --help, -h          Show this help message

ENVIRONMENT:
    CLIMASEGURO_CONFIG          Path to config file (overrides default location)
    CLIMASEGURO_LOG             Log level (trace, debug, info, warn, error)
    CLIMASEGURO_LLM_API_KEY     API key for the configured AI provider

Config file location: $XDG_CONFIG_HOME/climaseguro/config.toml"#
    );
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(service: &ProcessService, command: Command) -> Result<()> {
    match command {
        Command::Funds => print_json(funds::list()),
        Command::Create { zone_id, context } => {
            let process = service.create_process(zone_id, context.as_deref())?;
            print_json(&process)
        }
        Command::Context { process_id } => print_json(&service.context(process_id)?),
        Command::SetContext { process_id, patch } => {
            let patch: serde_json::Value =
                serde_json::from_str(&patch).context("context patch is not valid JSON")?;
            print_json(&service.update_context(process_id, &patch)?)
        }
        Command::Upload { process_id, files } => {
            let uploads = files
                .iter()
                .map(|path| {
                    UploadedFile::from_path(path)
                        .with_context(|| format!("reading {}", path.display()))
                })
                .collect::<Result<Vec<_>>>()?;
            print_json(&service.upload_photos(process_id, &uploads)?)
        }
        Command::Form { process_id, input } => {
            let form_id = service.submit_form(process_id, &input)?;
            print_json(&serde_json::json!({ "form_id": form_id }))
        }
        Command::Preflight { process_id, fund } => print_json(&service.preflight(process_id, &fund)?),
        Command::Generate { process_id, fund } => {
            print_json(&service.generate_documents(process_id, &fund)?)
        }
        Command::Documents { process_id } => print_json(&service.list_documents(process_id)?),
        Command::Open {
            document_id,
            output,
        } => {
            let doc = service.open_document(document_id)?;
            let output = output.unwrap_or_else(|| PathBuf::from(&doc.filename));
            std::fs::write(&output, &doc.bytes)
                .with_context(|| format!("writing {}", output.display()))?;
            print_json(&serde_json::json!({
                "path": output,
                "mime": doc.mime,
                "size_bytes": doc.bytes.len(),
            }))
        }
        Command::Export { process_id, output } => {
            let count = export::export_process(service.database(), process_id, &output)?;
            print_json(&serde_json::json!({ "path": output, "documents": count }))
        }
        Command::ResetDb => {
            service.database().reset()?;
            print_json(&serde_json::json!({ "reset": true }))
        }
    }
}

/// 2 when the request itself was wrong (unknown process, bad input), 1 otherwise.
fn exit_code(error: &anyhow::Error) -> u8 {
    match error.downcast_ref::<PipelineError>() {
        Some(e) if e.is_caller_error() => 2,
        _ => 1,
    }
}

fn main() -> Result<ExitCode> {
    let cli = parse_args();

    let target = if cli.log_stderr {
        LogTarget::Stderr
    } else {
        LogTarget::System(Some(Config::config_dir().join("logs")))
    };
    let _ = logging::init(target);

    let config = match &cli.config_path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load().context("loading config")?,
    };

    let service = ProcessService::from_config(&config).context("opening workspace")?;

    if let Err(e) = run(&service, cli.command) {
        tracing::error!(error = %format!("{:#}", e), "Command failed");
        eprintln!("Error: {:#}", e);
        return Ok(ExitCode::from(exit_code(&e)));
    }
    Ok(ExitCode::SUCCESS)
}
