use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info, warn};
use wrap_exception::{wrap, Caught};

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct ValidationError(&'static str);

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct ConnectionError(&'static str);

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct DbQueryError(&'static str);

/// Connects to a fake database and lists its users.
#[derive(Debug, Parser)]
struct Args {
    #[clap(default_value = "postgres://localhost/users")]
    database_url: String,

    /// Pretend the connection went inactive after connecting.
    #[clap(long)]
    inactive: bool,

    /// Pretend the query returned nothing.
    #[clap(long)]
    empty: bool,
}

#[derive(Debug, Clone)]
struct DbConnection {
    id: String,
    database_url: String,
    active: bool,
}

#[derive(Debug)]
struct User {
    name: String,
    age: u32,
}

fn validate_db_url(database_url: &str) -> Result<(), ValidationError> {
    if database_url.is_empty() {
        return Err(ValidationError("database_url is required"));
    }
    if database_url.starts_with("mysql://") {
        return Err(ValidationError("database_url is invalid"));
    }

    Ok(())
}

async fn connect_to_db(database_url: String, inactive: bool) -> Result<DbConnection> {
    validate_db_url(&database_url)?;

    tokio::time::sleep(Duration::from_millis(50)).await;

    let connection = DbConnection {
        id: "connection-id".into(),
        database_url,
        active: !inactive,
    };
    if !connection.active {
        return Err(ConnectionError("connection inactive").into());
    }

    Ok(connection)
}

async fn fetch_users(connection: DbConnection, empty: bool) -> Result<Vec<User>> {
    if !connection.active {
        return Err(ConnectionError("connection is not active").into());
    }

    tokio::time::sleep(Duration::from_millis(50)).await;

    if empty {
        return Err(DbQueryError("query did not return the expected values").into());
    }

    Ok(vec![
        User {
            name: "Joost".into(),
            age: 21,
        },
        User {
            name: "Kapsalon".into(),
            age: 23,
        },
    ])
}

async fn handler(args: Args) -> u16 {
    let connect = wrap(connect_to_db);
    let fetch = wrap(fetch_users);

    let connection = match connect
        .call((args.database_url, args.inactive))
        .await
        .into_result()
    {
        Ok(connection) => connection,
        Err(Caught::Raised(err)) if err.is::<ValidationError>() => {
            warn!("bad connection request: {}", err);
            return 400;
        }
        Err(Caught::Raised(err)) if err.is::<ConnectionError>() => {
            error!("connection failed: {}", err);
            return 503;
        }
        Err(err) => {
            error!("connection failed: {}", err);
            return 500;
        }
    };

    info!("connected {} to {}", connection.id, connection.database_url);

    match fetch.call((connection, args.empty)).await.into_result() {
        Ok(users) => {
            for user in &users {
                info!("user {} ({})", user.name, user.age);
            }
            200
        }
        Err(Caught::Raised(err)) if err.is::<ConnectionError>() => {
            error!("fetch users failed: {}", err);
            503
        }
        Err(Caught::Raised(err)) if err.is::<DbQueryError>() => {
            warn!("users not found: {}", err);
            404
        }
        Err(err) => {
            error!("fetch users failed: {}", err);
            500
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let status = handler(Args::parse()).await;

    info!("status: {}", status);

    Ok(())
}
