// src/main.rs

use std::{path::PathBuf, sync::Arc};

use chrono::Utc;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use tryout_client::{
    api::{
        ApiClient,
        catalog::{available_packages, paginate},
        profile::ResendCooldown,
    },
    config::Config,
    error::AppError,
    models::{
        question::OptionLetter,
        user::RegisterRequest,
    },
    quiz::{
        countdown::{SystemClock, format_mm_ss},
        grading::GradeReport,
        lifecycle::{
            AttemptPhase, best_grade, classify, format_hms, format_minutes_readable,
            grade_band, grade_expired_attempt, start_new_attempt,
        },
        navigation::{all_answered, answered_ordinals, flagged_ordinals},
        review::{build_review, tally},
        synchronizer::AttemptSynchronizer,
    },
    render::{
        export::{DEFAULT_EXPORT_FILE, ExportMeta, write_review},
        html::{RenderOptions, render_question},
        palette::ColorAllocator,
        text::plain_text,
    },
};

#[derive(Parser)]
#[command(name = "tryout")]
#[command(version, about = "Take timed tryouts from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Backend base URL
    #[arg(long, global = true, env = "TRYOUT_API_URL")]
    api_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List your attempts for a tryout
    Attempts {
        tryout_id: String,
    },

    /// Start a new attempt
    Start {
        tryout_id: String,
    },

    /// Show the questions of an attempt
    Show {
        tryout_id: String,
        attempt: i64,

        /// Print HTML fragments instead of plain text
        #[arg(long)]
        html: bool,

        /// Keep running with a countdown and submit when time is up
        #[arg(long)]
        watch: bool,
    },

    /// Answer a question (`-` clears the answer)
    Answer {
        tryout_id: String,
        attempt: i64,
        question_id: i64,
        letter: String,
    },

    /// Toggle the flag of a question
    Flag {
        tryout_id: String,
        attempt: i64,
        question_id: i64,
    },

    /// Grade and finish an attempt
    Submit {
        tryout_id: String,
        attempt: i64,

        /// Submit even with unanswered questions
        #[arg(long)]
        force: bool,
    },

    /// Grade an attempt that ran out of time
    GradeExpired {
        tryout_id: String,
        attempt: i64,
    },

    /// Review a finished attempt
    Review {
        tryout_id: String,
        attempt: i64,
    },

    /// Export questions and explanations as a Word document
    Export {
        tryout_id: String,
        #[arg(default_value = DEFAULT_EXPORT_FILE)]
        output: PathBuf,
    },

    /// Download the tryout PDF
    Pdf {
        tryout_id: String,
        output: PathBuf,
    },

    /// Browse packages
    Packages {
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Only packages you do not own yet
        #[arg(long)]
        available: bool,
    },

    /// Manage your account
    #[command(subcommand)]
    Profile(ProfileCommands),

    /// Store an access token
    LoginToken {
        token: String,
    },

    /// Forget the stored token
    Logout,
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show the current user
    Show,

    /// Change the avatar (foto1, foto2, foto3)
    Photo {
        foto: String,
    },

    /// Email a password verification code
    SendCode,

    /// Change the password with an emailed code
    VerifyCode {
        code: String,
        new_password: String,
    },

    /// Create an account
    Register {
        email: String,
        password: String,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let mut config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "tryout.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    let cli = Cli::parse();
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }

    if let Err(e) = run(cli.command, &config).await {
        tracing::error!("Command failed: {:?}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: &Config) -> Result<(), AppError> {
    let client = ApiClient::from_config(config)?;

    match command {
        Commands::Attempts { tryout_id } => list_attempts(&client, &tryout_id).await,
        Commands::Start { tryout_id } => {
            let tryout = client.get_tryout(&tryout_id).await?;
            let attempt =
                start_new_attempt(&client, &tryout_id, tryout.duration_minutes, Utc::now()).await?;
            println!(
                "Started attempt #{} of {} ({})",
                attempt.attempt_number,
                tryout.name,
                format_minutes_readable(attempt.duration_minutes.or(tryout.duration_minutes))
            );
            Ok(())
        }
        Commands::Show {
            tryout_id,
            attempt,
            html,
            watch,
        } => {
            let mut sync = open(&client, &tryout_id, attempt).await?;
            print_questions(&sync, html);
            if watch {
                watch_attempt(&mut sync).await?;
            }
            Ok(())
        }
        Commands::Answer {
            tryout_id,
            attempt,
            question_id,
            letter,
        } => {
            let mut sync = open(&client, &tryout_id, attempt).await?;
            if letter.trim() == "-" {
                sync.clear_answer(question_id).await?;
            } else {
                let letter = OptionLetter::parse(&letter).ok_or_else(|| {
                    AppError::Validation(format!("'{}' is not an option a-e", letter))
                })?;
                sync.set_answer(question_id, letter).await?;
            }
            println!("{}", sync.answer_order());
            Ok(())
        }
        Commands::Flag {
            tryout_id,
            attempt,
            question_id,
        } => {
            let mut sync = open(&client, &tryout_id, attempt).await?;
            sync.toggle_flag(question_id).await?;
            println!(
                "Question {} {}",
                question_id,
                if sync.is_flagged(question_id) { "flagged" } else { "unflagged" }
            );
            Ok(())
        }
        Commands::Submit {
            tryout_id,
            attempt,
            force,
        } => {
            let mut sync = open(&client, &tryout_id, attempt).await?;
            if !force && !all_answered(sync.questions(), sync.state()) {
                return Err(AppError::Validation(
                    "answer every question before submitting (or pass --force)".to_string(),
                ));
            }
            let report = sync.finalize(Utc::now()).await?;
            print_report(&report);
            Ok(())
        }
        Commands::GradeExpired { tryout_id, attempt } => {
            let record = client.get_attempt(&tryout_id, attempt).await?;
            let (_, report) = grade_expired_attempt(&client, &record, Utc::now()).await?;
            print_report(&report);
            Ok(())
        }
        Commands::Review { tryout_id, attempt } => {
            let sync = open(&client, &tryout_id, attempt).await?;
            if !sync.is_closed() {
                return Err(AppError::Validation(
                    "review is available once the attempt is finished".to_string(),
                ));
            }
            let items = build_review(sync.questions(), sync.state());
            for item in &items {
                let mark = if item.is_correct { "✓" } else { "✗" };
                let show = |l: Option<OptionLetter>| l.map_or("-".to_string(), |l| l.to_string());
                println!(
                    "{:>3}. {} jawaban {} / kunci {}",
                    item.ordinal,
                    mark,
                    show(item.user_answer),
                    show(item.correct_answer)
                );
                if let Some(explanation) = &item.explanation {
                    println!("     {}", plain_text(explanation));
                }
            }
            let (correct, total) = tally(&items);
            println!("{}/{} correct", correct, total);
            Ok(())
        }
        Commands::Export { tryout_id, output } => {
            let tryout = client.get_tryout(&tryout_id).await?;
            let questions = client.fetch_questions(&tryout_id).await?;
            let meta = ExportMeta {
                tryout_name: tryout.name,
                duration_minutes: tryout.duration_minutes,
                grade: None,
            };
            write_review(&output, &meta, &questions)?;
            println!("Exported {} questions to {}", questions.len(), output.display());
            Ok(())
        }
        Commands::Pdf { tryout_id, output } => {
            let bytes = client.fetch_pdf(&tryout_id).await?;
            std::fs::write(&output, &bytes)?;
            println!("Saved {} bytes to {}", bytes.len(), output.display());
            Ok(())
        }
        Commands::Packages { page, available } => {
            let packages = if available {
                let owned = client.list_owned_packages().await?;
                available_packages(client.list_packages().await?, &owned)
            } else {
                client.list_packages().await?
            };
            let listing = paginate(&packages, page);
            let mut colors = ColorAllocator::with_default_pool();
            for package in &listing.items {
                println!(
                    "[{}] {} - Rp {} ({})",
                    package.id,
                    package.name,
                    package.price,
                    colors.next_color().unwrap_or("-")
                );
                for detail in package.details() {
                    println!("    * {}", detail);
                }
            }
            println!("Page {}/{}", listing.page, listing.total_pages);
            Ok(())
        }
        Commands::Profile(cmd) => run_profile(&client, cmd).await,
        Commands::LoginToken { token } => {
            client.tokens().save(token.trim())?;
            println!("Token saved to {}", client.tokens().path().display());
            Ok(())
        }
        Commands::Logout => {
            client.logout()?;
            println!("Logged out");
            Ok(())
        }
    }
}

async fn run_profile(client: &ApiClient, cmd: ProfileCommands) -> Result<(), AppError> {
    match cmd {
        ProfileCommands::Show => {
            let profile = client.get_profile().await?;
            println!("{} (avatar: {})", profile.email, profile.avatar().unwrap_or("-"));
        }
        ProfileCommands::Photo { foto } => {
            client.update_photo(&foto).await?;
            println!("Avatar changed to {}", foto);
        }
        ProfileCommands::SendCode => {
            let mut cooldown = ResendCooldown::default();
            client.send_password_code(&mut cooldown).await?;
            println!("Verification code sent");
        }
        ProfileCommands::VerifyCode { code, new_password } => {
            let res = client.verify_password_code(&code, &new_password).await?;
            println!("{}", res.message.unwrap_or_else(|| "Password changed".to_string()));
        }
        ProfileCommands::Register { email, password } => {
            let res = client.register(&RegisterRequest { email, password }).await?;
            println!("{}", res.message.unwrap_or_else(|| "Registered".to_string()));
        }
    }
    Ok(())
}

async fn open(
    client: &ApiClient,
    tryout_id: &str,
    attempt: i64,
) -> Result<AttemptSynchronizer<ApiClient>, AppError> {
    AttemptSynchronizer::open(Arc::new(client.clone()), tryout_id, Some(attempt)).await
}

async fn list_attempts(client: &ApiClient, tryout_id: &str) -> Result<(), AppError> {
    let tryout = client.get_tryout(tryout_id).await?;
    let attempts = client.list_attempts(tryout_id).await?;
    let now = Utc::now();

    println!("{} ({})", tryout.name, format_minutes_readable(tryout.duration_minutes));
    for attempt in &attempts {
        let phase = match classify(attempt, tryout.duration_minutes, now) {
            AttemptPhase::Active { remaining_seconds } => {
                format!("in progress, {} left", format_hms(remaining_seconds))
            }
            AttemptPhase::Expired => "time is up, needs grading".to_string(),
            AttemptPhase::Finished => {
                format!("finished, grade {}", attempt.grade.as_deref().unwrap_or("-"))
            }
        };
        println!("  #{} {}", attempt.attempt_number, phase);
    }

    match best_grade(&attempts) {
        Some(best) => println!("Best grade: {:.2} ({:?})", best, grade_band(best)),
        None => println!("No attempts yet"),
    }
    Ok(())
}

fn print_questions(sync: &AttemptSynchronizer<ApiClient>, html: bool) {
    let questions = sync.questions();
    let state = sync.state();

    for (i, question) in questions.iter().enumerate() {
        let ordinal = i + 1;
        if html {
            let opts = RenderOptions {
                selected: state.answer(question.id),
                flagged: state.is_flagged(question.id),
                ..RenderOptions::default()
            };
            println!("{}", render_question(ordinal, question, &opts));
            continue;
        }

        let flag = if state.is_flagged(question.id) { " [flag]" } else { "" };
        println!("{}. {}{}", ordinal, plain_text(&question.text), flag);
        for option in &question.options {
            let marker = if state.answer(question.id) == Some(option.letter) { "*" } else { " " };
            println!(
                "  {} {}. {}",
                marker,
                option.letter.as_char().to_ascii_uppercase(),
                plain_text(&option.text)
            );
        }
    }

    println!(
        "Answered {:?} / flagged {:?} of {}",
        answered_ordinals(questions, state),
        flagged_ordinals(questions, state),
        questions.len()
    );
}

async fn watch_attempt(sync: &mut AttemptSynchronizer<ApiClient>) -> Result<(), AppError> {
    if sync.is_closed() {
        return Ok(());
    }
    let Some((handle, time_up)) = sync.spawn_countdown(Arc::new(SystemClock)) else {
        println!("This attempt has no time limit");
        return Ok(());
    };

    let mut ticks = handle.subscribe();
    tokio::pin!(time_up);
    loop {
        tokio::select! {
            _ = &mut time_up => break,
            changed = ticks.changed() => {
                if changed.is_err() {
                    break;
                }
                let remaining = *ticks.borrow_and_update();
                eprint!("\r{} ", format_mm_ss(remaining));
            }
        }
    }
    eprintln!();

    tracing::info!("Time is up, submitting attempt #{}", sync.attempt().attempt_number);
    let report = sync.finalize(Utc::now()).await?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &GradeReport) {
    println!("Grade: {} ({}/{} correct)", report.grade, report.correct, report.total);
    if !report.unrecognized.is_empty() {
        println!("Unreadable answers for questions {:?}", report.unrecognized);
    }
}
