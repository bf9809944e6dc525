/// Demo data for local environments
///
/// Creates one user per role and a handful of clients. Running the seed
/// again leaves existing rows untouched.

use sqlx::PgPool;
use tracing::{debug, info};

use crate::auth::password::{hash_password, PasswordError};
use crate::models::role::{Role, API_GUARD};
use crate::models::user::{CreateUser, User};

/// Password shared by every demo user
pub const DEMO_PASSWORD: &str = "12345678";

/// A demo user and the role it receives
#[derive(Debug, Clone, Copy)]
pub struct DemoUser {
    pub name: &'static str,
    pub email: &'static str,
    pub country: Option<&'static str>,
    pub age: Option<i32>,
    pub role: &'static str,
}

pub const DEMO_USERS: [DemoUser; 3] = [
    DemoUser {
        name: "Piero",
        email: "piero@prueba.com",
        country: Some("Peru"),
        age: Some(23),
        role: "superadmin",
    },
    DemoUser {
        name: "Emma",
        email: "emma@prueba.com",
        country: Some("United Kingdom"),
        age: Some(34),
        role: "admin",
    },
    DemoUser {
        name: "Client",
        email: "client@prueba.com",
        country: None,
        age: None,
        role: "client",
    },
];

/// (code, name, lastname, phone)
const DEMO_CLIENTS: [(&str, &str, &str, &str); 3] = [
    ("CL001", "Lucia", "Torres", "+51 987 654 321"),
    ("CL002", "Oliver", "Hughes", "+44 20 7946 0958"),
    ("CL003", "Mateo", "Rojas", "+51 912 345 678"),
];

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error("role {0} does not exist; run migrations first")]
    MissingRole(&'static str),
}

/// Summary of a seeding run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users_created: usize,
    pub clients_created: usize,
}

/// Seeds the demo users and clients
pub async fn seed_demo_data(pool: &PgPool) -> Result<SeedReport, SeedError> {
    let users_created = seed_demo_users(pool).await?;
    let clients_created = seed_demo_clients(pool).await?;

    info!(users_created, clients_created, "Demo data seeded");
    Ok(SeedReport {
        users_created,
        clients_created,
    })
}

/// Creates the demo users that don't exist yet and makes sure each holds its role
///
/// # Returns
///
/// Number of users created
pub async fn seed_demo_users(pool: &PgPool) -> Result<usize, SeedError> {
    let mut created = 0;

    for demo in DEMO_USERS {
        let user = match User::find_by_email(pool, demo.email).await? {
            Some(user) => {
                debug!(email = demo.email, "Demo user already exists");
                user
            }
            None => {
                created += 1;
                User::create(
                    pool,
                    CreateUser {
                        name: demo.name.to_string(),
                        email: demo.email.to_string(),
                        password_hash: hash_password(DEMO_PASSWORD)?,
                        country: demo.country.map(str::to_string),
                        age: demo.age,
                    },
                )
                .await?
            }
        };

        if !Role::assign_to_user(pool, user.id, demo.role, API_GUARD).await? {
            return Err(SeedError::MissingRole(demo.role));
        }
    }

    Ok(created)
}

async fn seed_demo_clients(pool: &PgPool) -> Result<usize, sqlx::Error> {
    let mut created = 0;

    for (code, name, lastname, phone) in DEMO_CLIENTS {
        let result = sqlx::query(
            r#"
            INSERT INTO clients (code, name, lastname, phone)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .bind(code)
        .bind(name)
        .bind(lastname)
        .bind(phone)
        .execute(pool)
        .await?;

        created += result.rows_affected() as usize;
    }

    Ok(created)
}
