use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "feed")]
#[command(about = "Feed order tracker CLI", long_about = None)]
struct Cli {
    /// Config layers in merge order; falls back to $FEED_CONFIG, then defaults
    #[arg(long = "config", global = true)]
    config_paths: Vec<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Storage backend commands
    Store {
        #[command(subcommand)]
        cmd: StoreCmd,
    },

    /// Order commands against the selected backend
    Orders {
        #[command(subcommand)]
        cmd: OrdersCmd,
    },

    /// Print the layered config hash and canonical JSON
    ConfigHash,
}

#[derive(Subcommand)]
enum StoreCmd {
    /// Show which backend is selected and what it holds (creates nothing)
    Status,

    /// Create the order file or table when missing
    Init,
}

#[derive(Subcommand)]
enum OrdersCmd {
    /// List orders by delivery date with days left and tag
    List {
        /// Print the list as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Kilograms still to deliver per feed type
    Totals,

    /// Add an order
    Add {
        #[arg(long)]
        customer: String,

        #[arg(long = "feed-type")]
        feed_type: String,

        /// Kilograms; decimal comma accepted
        #[arg(long)]
        quantity: String,

        /// Delivery date as DD.MM.YYYY.
        #[arg(long)]
        date: String,

        #[arg(long, default_value = "")]
        note: String,
    },

    /// Overwrite every field of an order
    Edit {
        #[arg(long, conflicts_with = "customer_match")]
        id: Option<i64>,

        /// Pick the first order with this customer instead of an id
        #[arg(long = "customer-match")]
        customer_match: Option<String>,

        #[arg(long)]
        customer: String,

        #[arg(long = "feed-type")]
        feed_type: String,

        #[arg(long)]
        quantity: String,

        #[arg(long)]
        date: String,

        #[arg(long, default_value = "")]
        note: String,
    },

    /// Mark an order delivered
    Done {
        #[arg(long, conflicts_with = "customer")]
        id: Option<i64>,

        #[arg(long)]
        customer: Option<String>,
    },

    /// Remove an order
    Delete {
        #[arg(long, conflicts_with = "customer")]
        id: Option<i64>,

        #[arg(long)]
        customer: Option<String>,
    },

    /// Copy every order of the selected backend into a CSV file (replaced)
    Export {
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Silent if the file does not exist.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();
    let loaded = commands::load_config(&cli.config_paths)?;

    match cli.cmd {
        Commands::ConfigHash => {
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Store { cmd } => match cmd {
            StoreCmd::Status => commands::store::status(&loaded.config).await?,
            StoreCmd::Init => commands::store::init(&loaded.config).await?,
        },

        Commands::Orders { cmd } => {
            let svc = commands::open_service(&loaded.config).await?;
            match cmd {
                OrdersCmd::List { json } => commands::orders::list(&svc, json).await?,
                OrdersCmd::Totals => commands::orders::totals(&svc).await,
                OrdersCmd::Add {
                    customer,
                    feed_type,
                    quantity,
                    date,
                    note,
                } => {
                    let form = feed_orders::OrderForm::new(customer, feed_type, quantity, date, note);
                    commands::orders::add(&svc, &form).await?;
                }
                OrdersCmd::Edit {
                    id,
                    customer_match,
                    customer,
                    feed_type,
                    quantity,
                    date,
                    note,
                } => {
                    let sel = commands::selector(id, customer_match)?;
                    let form = feed_orders::OrderForm::new(customer, feed_type, quantity, date, note);
                    commands::orders::edit(&svc, &sel, &form).await?;
                }
                OrdersCmd::Done { id, customer } => {
                    let sel = commands::selector(id, customer)?;
                    commands::orders::mark_done(&svc, &sel).await?;
                }
                OrdersCmd::Delete { id, customer } => {
                    let sel = commands::selector(id, customer)?;
                    commands::orders::delete(&svc, &sel).await?;
                }
                OrdersCmd::Export { path } => commands::orders::export(&svc, &path).await?,
            }
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();
}
