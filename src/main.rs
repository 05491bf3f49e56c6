use clap::{Parser, Subcommand};

mod job;
mod platform;
mod render;
mod sheet;
mod submit;
mod value;

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "gear-submit", version)]
#[command(about = "Submit a spreadsheet of gear runs to a neuroimaging platform", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse the sheet and print the job for every row, without contacting the platform.
    Plan {
        #[arg(long)]
        sheet: String,

        /// Write JSON here instead of stdout.
        #[arg(short = 'o', long)]
        out: Option<String>,
    },

    /// Submit one gear run per sheet row.
    Submit {
        #[arg(long)]
        sheet: String,

        /// Group that owns the project.
        #[arg(long, env = "FW_GROUP", default_value = "gkaguirrelab")]
        group: String,

        #[arg(long, env = "FW_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// API root, e.g. https://site.example.org/api (derived from the key by default).
        #[arg(long, env = "FW_BASE_URL")]
        base_url: Option<String>,

        /// Reserved; existing analyses are currently always kept.
        #[arg(long, default_value_t = false)]
        overwrite_existing: bool,

        /// Also write the JSON report here.
        #[arg(short = 'o', long)]
        out: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    match cli.cmd {
        Commands::Plan { sheet, out } => {
            let layout = sheet::SheetLayout::from_path(&sheet)?;
            let plans = job::build_plans(&layout)?;
            log::info!(
                "{}: {} rows for {} on {}",
                sheet,
                plans.len(),
                layout.gear_name,
                layout.project_label
            );

            let json = serde_json::to_string_pretty(&serde_json::json!({
                "project": layout.project_label,
                "gear": layout.gear_name,
                "defaults": layout.defaults,
                "columns": layout.columns,
                "jobs": plans,
            }))?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("Wrote {}", path);
                }
                None => println!("{}", json),
            }
        }
        Commands::Submit {
            sheet,
            group,
            api_key,
            base_url,
            overwrite_existing,
            out,
        } => {
            // 1) Parse and translate the whole sheet before touching the platform.
            let layout = sheet::SheetLayout::from_path(&sheet)?;
            let plans = job::build_plans(&layout)?;

            // 2) Connect.
            let creds = platform::credentials::Credentials::resolve(api_key, base_url)?;
            let client = platform::HttpPlatform::new(&creds.base_url, &creds.api_key)?;

            // 3) Submit.
            let options = submit::SubmitOptions {
                group,
                overwrite_existing,
            };
            let report = submit::submit_all(
                &client,
                &layout.project_label,
                &layout.gear_name,
                &plans,
                &options,
            )?;

            print!("{}", render::render_summary(&report));
            if let Some(path) = out {
                std::fs::write(&path, serde_json::to_string_pretty(&report)?)?;
                println!("Wrote {}", path);
            }
        }
    }

    Ok(())
}
