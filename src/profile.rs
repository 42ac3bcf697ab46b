// src/profile.rs
// Connection details for one database endpoint.

use std::fmt;

/// `-h <host> [-p <port>]`, shared by every libpq client tool.
pub fn host_args(host: &str, port: Option<u16>) -> Vec<String> {
    let mut args = vec!["-h".to_string(), host.to_string()];
    if let Some(port) = port {
        args.push("-p".to_string());
        args.push(port.to_string());
    }
    args
}

/// One addressable database endpoint, source or destination.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionProfile {
    pub host: String,
    pub port: Option<u16>,
    pub dbname: String,
    pub user: String,
    pub password: String,
}

impl ConnectionProfile {
    pub fn new(host: &str, dbname: &str, user: &str, password: &str) -> Self {
        ConnectionProfile {
            host: host.to_string(),
            port: None,
            dbname: dbname.to_string(),
            user: user.to_string(),
            password: password.to_string(),
        }
    }

    pub fn with_port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    /// [`host_args`] followed by `-U <user> -d <dbname>`.
    pub fn connection_args(&self) -> Vec<String> {
        let mut args = host_args(&self.host, self.port);
        args.extend([
            "-U".to_string(),
            self.user.clone(),
            "-d".to_string(),
            self.dbname.clone(),
        ]);
        args
    }
}

impl fmt::Display for ConnectionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}@{}:{}/{}", self.user, self.host, port, self.dbname),
            None => write!(f, "{}@{}/{}", self.user, self.host, self.dbname),
        }
    }
}

impl fmt::Debug for ConnectionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionProfile")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}
