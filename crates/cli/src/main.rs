use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fxdesk_core::analyze::{analyze, Analysis};
use fxdesk_core::config::Settings;
use fxdesk_core::domain::fields::ContentFields;
use fxdesk_core::domain::records::{Favorite, ScheduledPost};
use fxdesk_core::image::ImageAttachment;
use fxdesk_core::interaction::PresetAnswers;
use fxdesk_core::session::{Generated, Session};
use fxdesk_core::storage::JsonFileStore;
use fxdesk_core::submit::{HttpSubmitter, Submitter};

mod terminal;

use terminal::TerminalInteraction;

#[derive(Debug, Parser)]
#[command(name = "fxdesk", about = "Compose, check and post forex channel content")]
struct Cli {
    /// Answer yes to every confirmation prompt.
    #[arg(long, global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render a field set and show its risk score and writing advice.
    Render {
        /// JSON field set tagged with "type".
        fields: PathBuf,
    },

    /// Score arbitrary text. Reads stdin when no text is given.
    Analyze {
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,

        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Render a field set and post it to the submission endpoint.
    Submit {
        fields: PathBuf,

        #[arg(long)]
        image: Option<PathBuf>,

        /// Print the payload instead of posting it.
        #[arg(long)]
        dry_run: bool,
    },

    #[command(subcommand)]
    Favorites(FavoritesCommand),

    #[command(subcommand)]
    Schedules(SchedulesCommand),
}

#[derive(Debug, Subcommand)]
enum FavoritesCommand {
    List,
    Add {
        fields: PathBuf,

        #[arg(long)]
        name: Option<String>,
    },
    Show {
        id: u64,
    },
    Remove {
        id: u64,
    },
}

#[derive(Debug, Subcommand)]
enum SchedulesCommand {
    List,
    Add {
        fields: PathBuf,

        #[command(flatten)]
        plan: PlanArgs,
    },
    Edit {
        id: u64,

        #[command(flatten)]
        plan: PlanArgs,
    },
    Toggle {
        id: u64,
    },
    Remove {
        id: u64,
    },
}

#[derive(Debug, Args)]
struct PlanArgs {
    #[arg(long)]
    name: Option<String>,

    /// daily, weekly, monthly, or any other wording. Blank means daily.
    #[arg(long)]
    frequency: Option<String>,

    /// HH:MM, 24-hour clock.
    #[arg(long)]
    time: Option<String>,
}

impl From<PlanArgs> for PresetAnswers {
    fn from(args: PlanArgs) -> Self {
        Self {
            schedule_name: args.name,
            frequency: args.frequency,
            time_of_day: args.time,
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli, &settings).await {
        sentry_anyhow::capture_anyhow(&err);
        return Err(err);
    }
    Ok(())
}

async fn run(cli: Cli, settings: &Settings) -> anyhow::Result<()> {
    match cli.command {
        Command::Analyze { text, file } => {
            let text = match (text, file) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("read {}", path.display()))?,
                (None, None) => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("read stdin failed")?;
                    buf
                }
            };
            print_analysis(&analyze(&text));
        }

        Command::Render { fields } => {
            let mut session = Session::in_memory();
            load_fields(&mut session, &fields)?;
            let generated = session.generate()?;
            print_generated(generated);
        }

        Command::Submit {
            fields,
            image,
            dry_run,
        } => {
            let mut session = Session::in_memory();
            load_fields(&mut session, &fields)?;
            if let Some(path) = image {
                session.attach_image(ImageAttachment::read_file(&path).await?);
            }

            if dry_run {
                let payload = session.prepare_submission()?;
                println!("{}", serde_json::to_string_pretty(&payload)?);
                return Ok(());
            }

            let submitter = HttpSubmitter::from_settings(settings)?;
            let response = session.submit(&submitter).await?;
            tracing::info!(endpoint = submitter.endpoint(), "submitted");
            println!("{}", serde_json::to_string_pretty(&response)?);
        }

        Command::Favorites(cmd) => favorites(cmd, settings, cli.yes)?,

        Command::Schedules(cmd) => schedules(cmd, settings, cli.yes)?,
    }
    Ok(())
}

fn favorites(cmd: FavoritesCommand, settings: &Settings, yes: bool) -> anyhow::Result<()> {
    let mut session = open_session(settings)?;
    match cmd {
        FavoritesCommand::List => {
            for fav in session.favorites() {
                print_favorite_line(fav);
            }
        }
        FavoritesCommand::Add { fields, name } => {
            load_fields(&mut session, &fields)?;
            let ui = TerminalInteraction::new(
                PresetAnswers {
                    favorite_name: name,
                    ..Default::default()
                },
                yes,
            );
            match session.save_favorite(&ui)? {
                Some(fav) => print_favorite_line(&fav),
                None => eprintln!("cancelled"),
            }
        }
        FavoritesCommand::Show { id } => {
            let fav = session.favorite(id)?;
            println!("{}", fav.rendered_text);
        }
        FavoritesCommand::Remove { id } => {
            let ui = TerminalInteraction::new(PresetAnswers::default(), yes);
            if session.delete_favorite(id, &ui)? {
                println!("deleted favorite {id}");
            } else {
                eprintln!("kept favorite {id}");
            }
        }
    }
    Ok(())
}

fn schedules(cmd: SchedulesCommand, settings: &Settings, yes: bool) -> anyhow::Result<()> {
    let mut session = open_session(settings)?;
    match cmd {
        SchedulesCommand::List => {
            for post in session.schedules() {
                print_schedule_line(post);
            }
        }
        SchedulesCommand::Add { fields, plan } => {
            load_fields(&mut session, &fields)?;
            let ui = TerminalInteraction::new(plan.into(), yes);
            match session.schedule_post(&ui)? {
                Some(post) => print_schedule_line(&post),
                None => eprintln!("cancelled"),
            }
        }
        SchedulesCommand::Edit { id, plan } => {
            let ui = TerminalInteraction::new(plan.into(), yes);
            match session.edit_schedule(id, &ui)? {
                Some(post) => print_schedule_line(&post),
                None => eprintln!("cancelled"),
            }
        }
        SchedulesCommand::Toggle { id } => {
            let post = session.toggle_schedule(id)?;
            print_schedule_line(&post);
        }
        SchedulesCommand::Remove { id } => {
            let ui = TerminalInteraction::new(PresetAnswers::default(), yes);
            if session.delete_schedule(id, &ui)? {
                println!("deleted scheduled post {id}");
            } else {
                eprintln!("kept scheduled post {id}");
            }
        }
    }
    Ok(())
}

fn open_session(settings: &Settings) -> anyhow::Result<Session> {
    let dir = settings.data_dir();
    let store = JsonFileStore::open(&dir)
        .with_context(|| format!("open data dir {}", dir.display()))?;
    Session::open(Box::new(store)).context("load collections failed")
}

/// Reads a tagged field set and makes its type the current one.
fn load_fields(session: &mut Session, path: &Path) -> anyhow::Result<()> {
    let raw =
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let fields: ContentFields = serde_json::from_str(&raw)
        .with_context(|| format!("parse field set {}", path.display()))?;
    session.select(fields.content_type());
    session.set_fields(fields);
    Ok(())
}

fn print_generated(generated: &Generated) {
    println!("{}", generated.content);
    println!();
    print_analysis(&Analysis {
        risk: generated.risk.clone(),
        advice: generated.advice.clone(),
    });
}

fn print_analysis(analysis: &Analysis) {
    let risk = &analysis.risk;
    println!("Risk score: {}/100 ({:?})", risk.score, risk.level);
    for factor in &risk.factors {
        println!("  {:+} {}: {}", factor.delta, factor.label, factor.explanation);
    }
    println!("Advice:");
    for item in analysis.advice.items() {
        println!("  - {}: {}", item.title, item.explanation);
    }
}

fn print_favorite_line(fav: &Favorite) {
    println!(
        "{}\t{}\t{}\t{}",
        fav.id,
        fav.content_type,
        fav.created_at.format("%Y-%m-%d %H:%M"),
        fav.display_name
    );
}

fn print_schedule_line(post: &ScheduledPost) {
    println!(
        "{}\t{}\t{} {}\t{}\t{}",
        post.id,
        post.content_type,
        post.frequency,
        post.time_of_day,
        if post.active { "active" } else { "paused" },
        post.display_name
    );
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
