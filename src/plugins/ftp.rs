//! FTP weak-credential check

use super::{Plugin, PluginResult, Severity};
use crate::network::format_address;
use crate::ScanError;
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Tried in order over a single control connection
const WEAK_CREDENTIALS: &[(&str, &str)] = &[
    ("admin", "admin"),
    ("admin", "123456"),
    ("admin", "password"),
    ("root", "root"),
    ("root", "123456"),
    ("ftp", "ftp"),
    ("anonymous", ""),
    ("anonymous", "anonymous"),
];

const REPLY_BUFFER_SIZE: usize = 1024;

#[derive(Debug, Default, Clone, Copy)]
pub struct FtpWeakPassPlugin;

impl FtpWeakPassPlugin {
    pub fn new() -> Self {
        Self
    }

    /// One `USER`/`PASS` exchange. Any I/O failure counts as a rejected login.
    async fn try_login(stream: &mut TcpStream, username: &str, password: &str, io_timeout: Duration) -> bool {
        let user_reply = match Self::command(stream, &format!("USER {}\r\n", username), io_timeout).await {
            Ok(reply) => reply,
            Err(e) => {
                log::debug!("USER {} failed: {}", username, e);
                return false;
            }
        };
        if !user_reply.starts_with("331") {
            return false;
        }

        match Self::command(stream, &format!("PASS {}\r\n", password), io_timeout).await {
            Ok(reply) => reply.starts_with("230"),
            Err(e) => {
                log::debug!("PASS for {} failed: {}", username, e);
                false
            }
        }
    }

    async fn command(stream: &mut TcpStream, line: &str, io_timeout: Duration) -> crate::Result<String> {
        timeout(io_timeout, stream.write_all(line.as_bytes())).await??;
        Self::read_reply(stream, io_timeout).await
    }

    async fn read_reply(stream: &mut TcpStream, io_timeout: Duration) -> crate::Result<String> {
        let mut buffer = [0u8; REPLY_BUFFER_SIZE];
        let n = timeout(io_timeout, stream.read(&mut buffer)).await??;
        if n == 0 {
            return Err(ScanError::NetworkError("connection closed by server".to_string()));
        }
        Ok(String::from_utf8_lossy(&buffer[..n]).to_string())
    }
}

#[async_trait]
impl Plugin for FtpWeakPassPlugin {
    fn name(&self) -> &'static str {
        "ftp-weakpass"
    }

    fn description(&self) -> &'static str {
        "Checks FTP services for weak or default credentials"
    }

    fn services(&self) -> &'static [&'static str] {
        &["ftp"]
    }

    fn default_port(&self) -> u16 {
        21
    }

    async fn scan(&self, target: &str, port: u16, io_timeout: Duration) -> crate::Result<PluginResult> {
        let address = format_address(target, port);

        let mut stream = timeout(io_timeout, TcpStream::connect(address.as_str()))
            .await?
            .map_err(|e| ScanError::NetworkError(format!("{}: {}", address, e)))?;

        let greeting = Self::read_reply(&mut stream, io_timeout).await?;
        if !greeting.to_lowercase().contains("ftp") {
            return Err(ScanError::ServiceMismatch("not an FTP service".to_string()));
        }

        for &(username, password) in WEAK_CREDENTIALS {
            if Self::try_login(&mut stream, username, password, io_timeout).await {
                log::warn!("{} accepts weak FTP credentials {}/{}", address, username, password);
                return Ok(PluginResult::vulnerable(
                    Severity::Medium,
                    format!("Weak credentials accepted: {}/{}", username, password),
                ));
            }
        }

        Ok(PluginResult::not_vulnerable("No common weak credentials accepted"))
    }
}
