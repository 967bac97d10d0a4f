//! Sign-in commands

use super::open_shelf;
use anyhow::Result;
use std::path::Path;

/// Sign in as a known user
pub async fn login(data_dir: &Path, username: &str) -> Result<()> {
    let mut shelf = open_shelf(data_dir).await?;

    let user = shelf.login(username).await?;
    if user.is_admin {
        println!("Signed in as {} (admin)", user.username);
    } else {
        println!("Signed in as {}", user.username);
    }
    Ok(())
}

/// Create a regular account and sign in as it
pub async fn register(data_dir: &Path, username: &str, email: &str) -> Result<()> {
    let mut shelf = open_shelf(data_dir).await?;
    let user = shelf.register(username, email).await?;
    println!("Registered and signed in as {}", user.username);
    Ok(())
}

/// Sign out
pub async fn logout(data_dir: &Path) -> Result<()> {
    let mut shelf = open_shelf(data_dir).await?;
    if shelf.current_user().is_none() {
        println!("Not signed in");
        return Ok(());
    }
    shelf.logout().await?;
    println!("Signed out");
    Ok(())
}

/// Show the signed-in user
pub async fn whoami(data_dir: &Path) -> Result<()> {
    let shelf = open_shelf(data_dir).await?;
    match shelf.current_user() {
        Some(user) => {
            println!("Username: {}", user.username);
            println!("Email:    {}", user.email);
            println!("Admin:    {}", if user.is_admin { "yes" } else { "no" });
        }
        None => println!("Not signed in"),
    }
    Ok(())
}
