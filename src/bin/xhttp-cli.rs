use clap::{Parser, Subcommand};
use serde_json::Value;
use xhttp_sdk::{ClientError, XhttpClient, DEFAULT_VERSION};

#[derive(Parser)]
#[command(name = "xhttp-cli")]
#[command(about = "Command-line client for XHTTP nodes", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8888")]
    url: String,

    /// Value sent in X-Version
    #[arg(short = 'V', long = "xhttp-version", default_value = DEFAULT_VERSION)]
    xhttp_version: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the versions a service declares
    Versions { service: String },
    /// Show a service's info pairs
    Info { service: String },
    /// Request a service's schema
    Schema { service: String },
    /// Invoke an action
    Perform {
        service: String,
        action: String,
        /// Declared argument as NAME=TYPE, repeatable
        #[arg(short, long = "arg", value_parser = parse_argument)]
        args: Vec<(String, i64)>,
        /// Raw request body
        #[arg(short, long, default_value = "")]
        body: String,
    },
}

fn parse_argument(s: &str) -> Result<(String, i64), String> {
    let (name, type_code) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=TYPE, got '{}'", s))?;
    let type_code = type_code
        .parse::<i64>()
        .map_err(|_| format!("type code '{}' is not an integer", type_code))?;
    Ok((name.to_string(), type_code))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = XhttpClient::new(&cli.url).with_version(&cli.xhttp_version);

    let result: Result<Value, ClientError> = match cli.command {
        Commands::Versions { service } => client.versions(&service).await.map(Value::from),
        Commands::Info { service } => match client.info(&service).await {
            Ok(pairs) => serde_json::to_value(pairs).map_err(ClientError::from),
            Err(e) => Err(e),
        },
        Commands::Schema { service } => client.schema(&service).await,
        Commands::Perform {
            service,
            action,
            args,
            body,
        } => {
            let args: Vec<(&str, i64)> = args.iter().map(|(n, t)| (n.as_str(), *t)).collect();
            client.perform(&service, &action, &args, body.into_bytes()).await
        }
    };

    match result {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Err(ClientError::Protocol {
            status_line,
            exception,
            ..
        }) => {
            eprintln!("Error: {}", status_line);
            if let Some(exception) = exception {
                eprintln!("{}", exception);
            }
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}
