use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;
use schoolyard_cli::admin::create_admin;
use schoolyard_cli::seeder::{self, SeedConfig};
use schoolyard_config::DatabaseConfig;
use sqlx::PgPool;

#[derive(Parser)]
#[command(name = "schoolyard-cli")]
#[command(about = "Schoolyard CLI - Administrative tools for Schoolyard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new administrator account
    CreateAdmin {
        /// First name of the admin
        #[arg(short = 'f', long)]
        first_name: Option<String>,

        /// Last name of the admin
        #[arg(short = 'l', long)]
        last_name: Option<String>,

        /// Email address
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Apply pending database migrations
    Migrate,
    /// Seed the database with fake teachers, parents, classrooms and students
    Seed {
        /// Number of teachers
        #[arg(long, default_value = "10")]
        teachers: usize,

        /// Number of classrooms (three sections per grade)
        #[arg(long, default_value = "6")]
        classrooms: usize,

        /// Number of students, spread evenly over the classrooms
        #[arg(long, default_value = "150")]
        students: usize,

        /// Academic year the classrooms belong to
        #[arg(short = 'y', long, default_value = "2024-2025")]
        academic_year: String,
    },
    /// Clear all data except admin accounts
    ClearSeed,
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() {
    dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = run(cli.command).await {
        eprintln!("\n❌ {}", e);
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> CliResult {
    let config = DatabaseConfig {
        max_connections: 5,
        ..DatabaseConfig::from_env()
    };
    let pool = schoolyard_db::init_db_pool(&config)
        .await
        .map_err(|e| format!("Failed to connect to database: {}", e))?;

    match command {
        Commands::CreateAdmin {
            first_name,
            last_name,
            email,
            password,
        } => handle_create_admin(&pool, first_name, last_name, email, password).await,
        Commands::Migrate => handle_migrate(&pool).await,
        Commands::Seed {
            teachers,
            classrooms,
            students,
            academic_year,
        } => {
            let config = SeedConfig::new(academic_year)
                .with_teachers(teachers)
                .with_classrooms(classrooms)
                .with_students(students);
            seeder::seed_all(&pool, config).await
        }
        Commands::ClearSeed => seeder::clear_all(&pool).await,
    }
}

fn prompt(value: Option<String>, label: &str) -> Result<String, dialoguer::Error> {
    match value {
        Some(value) => Ok(value),
        None => Input::new().with_prompt(label).interact_text(),
    }
}

async fn handle_create_admin(
    pool: &PgPool,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    password: Option<String>,
) -> CliResult {
    let first_name = prompt(first_name, "First name")?;
    let last_name = prompt(last_name, "Last name")?;
    let email = prompt(email, "Email address")?;
    let password = match password {
        Some(password) => password,
        None => Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords don't match")
            .interact()?,
    };

    create_admin(pool, &first_name, &last_name, &email, &password).await?;

    println!("\n✅ Admin created successfully!");
    println!("   Email: {}", email);
    println!("   Name: {} {}", first_name, last_name);
    Ok(())
}

async fn handle_migrate(pool: &PgPool) -> CliResult {
    schoolyard_db::run_migrations(pool).await?;
    println!("✅ Migrations applied");
    Ok(())
}
