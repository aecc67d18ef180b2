//! # FTP client: concrete [`RemoteStore`] over a session pool
//!
//! Bridges the core sync pipeline to a real FTP server. The pool holds as
//! many logged-in sessions as the configured concurrency limit, so checkout
//! blocks naturally once every session is busy and the host never sees more
//! simultaneous connections than configured.
//!
//! The underlying protocol client is blocking; every wire operation checks a
//! session out of the pool and runs on the tokio blocking pool, returning
//! the session afterwards. A per-operation failure surfaces as a per-file
//! failure upstream; only connect/login failures are fatal.

use std::collections::HashSet;
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpStream, Status};
use tokio::sync::mpsc;
use tracing::{debug, info};

use siteship_core::config::Credentials;
use siteship_core::contract::{RemoteError, RemoteStore};
use siteship_core::error::SyncError;

/// FTP-backed remote store with a fixed pool of logged-in sessions.
#[derive(Debug)]
pub struct FtpRemote {
    sessions_tx: mpsc::Sender<FtpStream>,
    sessions_rx: tokio::sync::Mutex<mpsc::Receiver<FtpStream>>,
    /// Directories already created this run, to skip repeat round-trips.
    created_dirs: Mutex<HashSet<String>>,
}

impl FtpRemote {
    /// Open and log in `sessions` FTP sessions up front.
    ///
    /// Any connection or authentication failure aborts the whole deploy
    /// before a single transfer is attempted.
    pub async fn connect(credentials: &Credentials, sessions: usize) -> Result<Self, SyncError> {
        let count = sessions.max(1);
        let addr = dial_addr(&credentials.host);
        let creds = credentials.clone();

        let streams = tokio::task::spawn_blocking(move || -> Result<Vec<FtpStream>, SyncError> {
            let mut streams = Vec::with_capacity(count);
            for _ in 0..count {
                let mut stream = FtpStream::connect(&addr)
                    .map_err(|e| SyncError::Connection(format!("{addr}: {e}")))?;
                stream.login(&creds.user, &creds.password).map_err(|e| {
                    SyncError::Connection(format!("login as '{}' rejected: {e}", creds.user))
                })?;
                stream
                    .transfer_type(FileType::Binary)
                    .map_err(|e| SyncError::Connection(e.to_string()))?;
                streams.push(stream);
            }
            Ok(streams)
        })
        .await
        .map_err(|e| SyncError::Connection(e.to_string()))??;

        info!(
            host = %credentials.host,
            sessions = count,
            "FTP session pool established"
        );

        let (sessions_tx, sessions_rx) = mpsc::channel(count);
        for stream in streams {
            if sessions_tx.try_send(stream).is_err() {
                return Err(SyncError::Connection(
                    "session pool initialisation failed".to_string(),
                ));
            }
        }
        Ok(Self {
            sessions_tx,
            sessions_rx: tokio::sync::Mutex::new(sessions_rx),
            created_dirs: Mutex::new(HashSet::new()),
        })
    }

    /// Check a session out, run `op` on the blocking pool, return it.
    async fn with_session<T, F>(&self, op: F) -> Result<T, RemoteError>
    where
        F: FnOnce(&mut FtpStream) -> Result<T, FtpError> + Send + 'static,
        T: Send + 'static,
    {
        let mut session = {
            let mut rx = self.sessions_rx.lock().await;
            rx.recv()
                .await
                .ok_or_else(|| -> RemoteError { "FTP session pool closed".into() })?
        };
        let (session, result) = tokio::task::spawn_blocking(move || {
            let result = op(&mut session);
            (session, result)
        })
        .await
        .map_err(|e| -> RemoteError { format!("blocking FTP task failed: {e}").into() })?;
        let _ = self.sessions_tx.try_send(session);
        result.map_err(|e| -> RemoteError { e.to_string().into() })
    }
}

#[async_trait]
impl RemoteStore for FtpRemote {
    async fn modified_time(&self, path: &str) -> Result<Option<DateTime<Utc>>, RemoteError> {
        let path = path.to_string();
        self.with_session(move |session| match session.mdtm(&path) {
            // RFC 3659: MDTM replies are UTC.
            Ok(naive) => Ok(Some(naive.and_utc())),
            Err(FtpError::UnexpectedResponse(resp)) if resp.status == Status::FileUnavailable => {
                Ok(None)
            }
            Err(e) => Err(e),
        })
        .await
    }

    async fn ensure_dir(&self, path: &str) -> Result<(), RemoteError> {
        let chain: Vec<String> = match self.created_dirs.lock() {
            Ok(created) => dir_chain(path)
                .into_iter()
                .filter(|segment| !created.contains(segment))
                .collect(),
            Err(_) => dir_chain(path),
        };
        if chain.is_empty() {
            return Ok(());
        }
        let to_create = chain.clone();
        self.with_session(move |session| {
            for segment in &to_create {
                match session.mkdir(segment) {
                    Ok(_) => debug!(dir = %segment, "Created remote directory"),
                    // Already exists (or otherwise refused); a genuine
                    // problem resurfaces when the upload itself fails.
                    Err(FtpError::UnexpectedResponse(resp))
                        if resp.status == Status::FileUnavailable => {}
                    Err(e) => return Err(e),
                }
            }
            Ok(())
        })
        .await?;
        if let Ok(mut created) = self.created_dirs.lock() {
            created.extend(chain);
        }
        Ok(())
    }

    async fn upload(&self, path: &str, local: &Path) -> Result<(), RemoteError> {
        let path = path.to_string();
        let local = local.to_path_buf();
        self.with_session(move |session| {
            let mut file = File::open(&local).map_err(FtpError::ConnectionError)?;
            session.put_file(&path, &mut file)?;
            Ok(())
        })
        .await
    }
}

/// Address to dial: `host` with the default FTP port unless one is given.
fn dial_addr(host: &str) -> String {
    if host.contains(':') {
        host.to_string()
    } else {
        format!("{host}:21")
    }
}

/// The cumulative directory chain of a remote path, shallowest first.
fn dir_chain(path: &str) -> Vec<String> {
    let absolute = path.starts_with('/');
    let mut chain = Vec::new();
    let mut acc = String::new();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if acc.is_empty() {
            acc = if absolute {
                format!("/{segment}")
            } else {
                segment.to_string()
            };
        } else {
            acc = format!("{acc}/{segment}");
        }
        chain.push(acc.clone());
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dial_addr_defaults_to_port_21() {
        assert_eq!(dial_addr("ftp.example.com"), "ftp.example.com:21");
        assert_eq!(dial_addr("ftp.example.com:2121"), "ftp.example.com:2121");
    }

    #[test]
    fn dir_chain_is_cumulative() {
        assert_eq!(
            dir_chain("/www/site/css"),
            vec!["/www", "/www/site", "/www/site/css"]
        );
        assert_eq!(dir_chain("site/css"), vec!["site", "site/css"]);
        assert!(dir_chain("/").is_empty());
    }
}
