//! Authentication command handlers.

use std::io::{BufRead, Write};

use url::Url;

use crate::auth::askpass;
use crate::auth::{endpoint_origin, Account, CredentialSource, CredentialStore, StoredCredential};
use crate::error::{GitexecError, Result};

/// Reads the token from the first line of `input`.
fn read_token(mut input: impl BufRead) -> Result<String> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    let token = line.trim();
    if token.is_empty() {
        return Err(GitexecError::Config("no token given on stdin".to_string()));
    }
    Ok(token.to_string())
}

/// Handle the `gitexec auth login` command.
pub fn handle_login(endpoint: &Url, login: &str) -> Result<()> {
    let account = Account::new(endpoint, login)?;

    eprint!("Token for {account}: ");
    std::io::stderr().flush()?;
    let token = read_token(std::io::stdin().lock())?;

    CredentialStore::new().save(
        &account.endpoint,
        &StoredCredential {
            login: account.login.clone(),
            token,
        },
    )?;

    println!("Stored credentials for {account}.");
    Ok(())
}

/// Handle the `gitexec auth logout` command.
pub fn handle_logout(endpoint: &Url) -> Result<()> {
    let endpoint = endpoint_origin(endpoint)?;
    let store = CredentialStore::new();

    if store.load(&endpoint)?.is_some() {
        store.delete(&endpoint)?;
        println!("Removed credentials for {}.", endpoint.origin().ascii_serialization());
    } else {
        println!("No credentials stored for {}.", endpoint.origin().ascii_serialization());
    }

    Ok(())
}

/// Handle the `gitexec auth status` command.
pub fn handle_status(endpoint: &Url) -> Result<()> {
    let endpoint = endpoint_origin(endpoint)?;

    match CredentialStore::new().load(&endpoint)? {
        Some(stored) => {
            println!("Logged in");
            println!();
            println!("  Host:  {}", endpoint.origin().ascii_serialization());
            println!("  Login: {}", stored.login);
        },
        None => {
            println!("Not logged in");
            println!();
            println!(
                "Run 'gitexec auth login {}' to store credentials.",
                endpoint.origin().ascii_serialization()
            );
        },
    }

    Ok(())
}

/// Handle the hidden `gitexec askpass` command. The answer is the only
/// thing written to stdout.
pub fn handle_askpass(prompt: &str) -> Result<()> {
    let answer = askpass::answer_from_env(prompt, &CredentialStore::new())?;
    println!("{answer}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_the_trimmed_first_line() {
        let token = read_token("  ghp_abc \nignored\n".as_bytes()).unwrap();
        assert_eq!(token, "ghp_abc");
    }

    #[test]
    fn empty_token_is_rejected() {
        assert!(read_token("\n".as_bytes()).is_err());
        assert!(read_token("".as_bytes()).is_err());
    }
}
