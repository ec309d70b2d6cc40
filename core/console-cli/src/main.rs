//! blog-console: command-line admin console for the blog backend.
//!
//! Each invocation is one page load: the stored token is reconciled with the
//! server-verified identity before any protected command runs.
//!
//! ## Subcommands
//!
//! - `login` / `logout` / `whoami` / `status` / `profile`: session
//! - `blogs`: list, show, create, update, delete, delete-image
//! - `users`: list, create, update, delete (admin only)

mod commands;
mod logging;
mod output;
mod tab;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use blog_console_protocol::UpdateUserRequest;
use clap::{Parser, Subcommand};
use console_core::{NewUserForm, Notice, StorageConfig};

use commands::blogs::DescriptionSource;
use commands::{CommandResult, Context};
use tab::TerminalNavigator;

#[derive(Parser)]
#[command(name = "blog-console")]
#[command(about = "Blog admin console")]
#[command(version)]
struct Cli {
    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Tab scope (defaults to $BLOG_CONSOLE_TAB, then the parent shell)
    #[arg(long, global = true, value_name = "SCOPE")]
    tab: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in (password is read from stdin when omitted)
    Login {
        #[arg(long, short)]
        username: String,

        #[arg(long, short)]
        password: Option<String>,

        /// Route to continue at afterwards (for example `/blogs/3/edit`)
        #[arg(long, value_name = "ROUTE")]
        next: Option<String>,
    },

    /// Log out and clear the stored session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Show the local session state without contacting the server
    Status,

    /// Show or update your profile
    Profile {
        #[arg(long)]
        full_name: Option<String>,

        #[arg(long)]
        phone: Option<String>,
    },

    /// Manage blogs
    #[command(subcommand)]
    Blogs(BlogCommands),

    /// Manage users (admin only)
    #[command(subcommand)]
    Users(UserCommands),
}

#[derive(Subcommand)]
enum BlogCommands {
    List {
        #[arg(long)]
        page: Option<u32>,

        #[arg(long)]
        size: Option<u32>,
    },
    Show {
        #[arg(value_name = "BLOG_ID")]
        blog_id: i64,
    },
    Create {
        #[arg(long)]
        title: String,

        /// Description (rich-text HTML)
        #[arg(long, conflicts_with = "description_file")]
        description: Option<String>,

        #[arg(long, value_name = "PATH")]
        description_file: Option<PathBuf>,

        /// Image to attach (repeatable)
        #[arg(long = "image", value_name = "PATH")]
        images: Vec<PathBuf>,
    },
    Update {
        #[arg(value_name = "BLOG_ID")]
        blog_id: i64,

        #[arg(long)]
        title: Option<String>,

        #[arg(long, conflicts_with = "description_file")]
        description: Option<String>,

        #[arg(long, value_name = "PATH")]
        description_file: Option<PathBuf>,

        #[arg(long = "image", value_name = "PATH")]
        images: Vec<PathBuf>,
    },
    Delete {
        #[arg(value_name = "BLOG_ID")]
        blog_id: i64,
    },
    DeleteImage {
        #[arg(value_name = "IMAGE_ID")]
        image_id: i64,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    List {
        /// Filter by username or full name
        #[arg(long)]
        search: Option<String>,
    },
    Create {
        #[arg(long)]
        username: String,

        #[arg(long)]
        password: String,

        #[arg(long)]
        full_name: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long, default_value = "ROLE_COLLABORATOR")]
        role: String,
    },
    Update {
        #[arg(value_name = "USER_ID")]
        user_id: i64,

        #[arg(long)]
        full_name: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        role: Option<String>,
    },
    Delete {
        #[arg(value_name = "USER_ID")]
        user_id: i64,
    },
}

fn run(ctx: &Context, command: Commands) -> CommandResult {
    match command {
        Commands::Login {
            username,
            password,
            next,
        } => commands::session::login(ctx, username, password, next.as_deref()),
        Commands::Logout => commands::session::logout(ctx),
        Commands::Whoami => commands::session::whoami(ctx),
        Commands::Status => commands::session::status(ctx),
        Commands::Profile { full_name, phone } => {
            commands::session::profile(ctx, full_name, phone)
        }
        Commands::Blogs(command) => run_blogs(ctx, command),
        Commands::Users(command) => run_users(ctx, command),
    }
}

fn run_blogs(ctx: &Context, command: BlogCommands) -> CommandResult {
    match command {
        BlogCommands::List { page, size } => commands::blogs::list(ctx, page, size),
        BlogCommands::Show { blog_id } => commands::blogs::show(ctx, blog_id),
        BlogCommands::Create {
            title,
            description,
            description_file,
            images,
        } => commands::blogs::create(
            ctx,
            title,
            DescriptionSource {
                inline: description,
                file: description_file,
            },
            &images,
        ),
        BlogCommands::Update {
            blog_id,
            title,
            description,
            description_file,
            images,
        } => commands::blogs::update(
            ctx,
            blog_id,
            title,
            DescriptionSource {
                inline: description,
                file: description_file,
            },
            &images,
        ),
        BlogCommands::Delete { blog_id } => commands::blogs::delete(ctx, blog_id),
        BlogCommands::DeleteImage { image_id } => commands::blogs::delete_image(ctx, image_id),
    }
}

fn run_users(ctx: &Context, command: UserCommands) -> CommandResult {
    match command {
        UserCommands::List { search } => commands::users::list(ctx, search),
        UserCommands::Create {
            username,
            password,
            full_name,
            phone,
            role,
        } => commands::users::create(
            ctx,
            NewUserForm {
                username,
                password,
                full_name,
                phone_number: phone,
                role: commands::users::normalize_role(&role),
            },
        ),
        UserCommands::Update {
            user_id,
            full_name,
            phone,
            role,
        } => commands::users::update(
            ctx,
            user_id,
            UpdateUserRequest {
                full_name,
                phone_number: phone,
                role: role.as_deref().map(commands::users::normalize_role),
            },
        ),
        UserCommands::Delete { user_id } => commands::users::delete(ctx, user_id),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let storage = match StorageConfig::new() {
        Ok(storage) => storage,
        Err(err) => {
            eprintln!("{}", Notice::error(err.to_string()));
            return ExitCode::FAILURE;
        }
    };
    let _logging_guard = logging::init(&storage.logs_dir());

    let ctx = Context {
        storage,
        scope: cli.tab.clone().unwrap_or_else(tab::resolve_scope),
        navigator: Arc::new(TerminalNavigator::new()),
        json: cli.json,
    };
    tracing::debug!(scope = %ctx.scope, "blog-console starting");

    match run(&ctx, cli.command) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(err) => {
            if !err.already_reported(ctx.navigator.was_redirected()) {
                eprintln!("{}", Notice::error(err.to_string()));
            }
            tracing::warn!(error = %err, "Command failed");
            ExitCode::FAILURE
        }
    }
}
