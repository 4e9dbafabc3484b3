use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use lunchvote::{
    auth::hash_password,
    config::ConfigLoader,
    db,
    models::Role,
    repositories::{EmployeeRepository, NewAccount, NewEmployee, NewRestaurant, RestaurantRepository},
};
use sea_orm::TransactionTrait;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AdminRole {
    Employee,
    RestaurantOwner,
}

/// Create an administrator account together with its profile.
#[derive(Debug, Parser)]
#[command(name = "create_admin")]
struct Args {
    #[arg(long)]
    username: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
    /// Profile created alongside the account
    #[arg(long, value_enum, default_value = "employee")]
    role: AdminRole,
    /// Restaurant name, used with `--role restaurant-owner`
    #[arg(long)]
    restaurant_name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    if args.password.is_empty() {
        bail!("password must not be empty");
    }

    let loader = ConfigLoader::new();
    let config = loader.load().context("loading configuration")?;

    let conn = db::init_pool(&config)
        .await
        .context("initializing database connection pool")?;
    db::run_migrations(&conn)
        .await
        .context("applying database migrations")?;

    let password_hash = hash_password(&args.password).context("hashing password")?;
    let account = NewAccount {
        username: args.username.clone(),
        email: args.email,
        password_hash,
        first_name: String::new(),
        last_name: String::new(),
        role: Role::Employee,
        is_admin: true,
    };

    let txn = conn.begin().await.context("starting transaction")?;
    match args.role {
        AdminRole::Employee => {
            let record = EmployeeRepository::new(&txn)
                .create(NewEmployee {
                    account,
                    department: String::new(),
                })
                .await
                .context("creating admin employee")?;
            println!("Created admin employee {} (id {})", record.account.username, record.profile.id);
        }
        AdminRole::RestaurantOwner => {
            let restaurant_name = args
                .restaurant_name
                .unwrap_or_else(|| args.username.clone());
            let record = RestaurantRepository::new(&txn)
                .create(NewRestaurant {
                    account,
                    restaurant_name,
                })
                .await
                .context("creating admin restaurant owner")?;
            println!("Created admin restaurant {} (id {})", record.account.username, record.profile.id);
        }
    }
    txn.commit().await.context("committing admin account")?;

    Ok(())
}
