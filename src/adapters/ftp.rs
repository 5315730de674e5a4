use crate::config::FtpConfig;
use crate::utils::error::{Result, SheetCastError};
use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;
use suppaftp::types::FileType;
use suppaftp::{FtpStream, Mode};

/// 阻塞式 FTP 下載，一次下載對應一個連線
#[derive(Debug, Clone)]
pub struct FtpClient {
    config: FtpConfig,
}

impl FtpClient {
    pub fn new(config: FtpConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FtpConfig {
        &self.config
    }

    /// 下載遠端檔案到記憶體。連線建立後，不論登入或下載是否成功都會送出 QUIT。
    pub fn download(&self, remote_file: &str) -> Result<Vec<u8>> {
        let mut stream = self.connect()?;

        let result = self.login_and_retrieve(&mut stream, remote_file);

        match stream.quit() {
            Ok(()) => tracing::info!("FTP connection closed"),
            Err(e) => tracing::warn!(error = %e, "FTP QUIT failed; dropping connection"),
        }

        result
    }

    fn connect(&self) -> Result<FtpStream> {
        tracing::info!(
            host = %self.config.host,
            port = self.config.port,
            "Connecting to FTP server"
        );

        let addr = self.resolve()?;
        let stream = FtpStream::connect_timeout(addr, self.timeout())?;
        Ok(stream)
    }

    fn login_and_retrieve(&self, stream: &mut FtpStream, remote_file: &str) -> Result<Vec<u8>> {
        stream.get_ref().set_read_timeout(Some(self.timeout()))?;
        stream.get_ref().set_write_timeout(Some(self.timeout()))?;

        let username = self.config.username.as_deref().unwrap_or("anonymous");
        let password = self.config.password.as_deref().unwrap_or("anonymous");
        stream.login(username, password)?;

        // 被動模式，並忽略伺服器在 PASV 回應中宣告的位址
        stream.set_mode(Mode::Passive);
        stream.set_passive_nat_workaround(true);
        stream.transfer_type(FileType::Binary)?;

        tracing::info!("Successfully connected to FTP server");
        tracing::info!(remote_file, "Reading file content from FTP");

        let content = stream.retr_as_buffer(remote_file)?.into_inner();

        tracing::info!(
            remote_file,
            size = content.len(),
            "File content read successfully"
        );
        Ok(content)
    }

    fn resolve(&self) -> Result<SocketAddr> {
        (self.config.host.as_str(), self.config.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| SheetCastError::ConfigError {
                message: format!("FTP host '{}' did not resolve to an address", self.config.host),
            })
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    /// 單一連線的假 FTP 伺服器，回傳收到的所有指令
    fn spawn_server(reject_login: bool) -> (u16, JoinHandle<Vec<String>>) {
        let control = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = control.local_addr().unwrap().port();

        let handle = thread::spawn(move || {
            let data = TcpListener::bind("127.0.0.1:0").unwrap();
            let data_port = data.local_addr().unwrap().port();

            let (socket, _) = control.accept().unwrap();
            let mut writer = socket.try_clone().unwrap();
            writer.write_all(b"220 feed server ready\r\n").unwrap();

            let mut commands = Vec::new();
            for line in BufReader::new(socket).lines().map_while(|line| line.ok()) {
                let command = line.trim_end().to_string();
                let verb = command
                    .split(' ')
                    .next()
                    .unwrap_or_default()
                    .to_ascii_uppercase();
                let reply = match verb.as_str() {
                    "USER" => "331 Password required".to_string(),
                    "PASS" if reject_login => "530 Login incorrect".to_string(),
                    "PASS" => "230 Logged in".to_string(),
                    "TYPE" => "200 Type set to I".to_string(),
                    "PASV" => format!(
                        "227 Entering Passive Mode (127,0,0,1,{},{})",
                        data_port / 256,
                        data_port % 256
                    ),
                    "RETR" => "550 File not found".to_string(),
                    "QUIT" => "221 Goodbye".to_string(),
                    _ => "502 Command not implemented".to_string(),
                };
                commands.push(command);
                writer.write_all(format!("{}\r\n", reply).as_bytes()).unwrap();
                if verb == "QUIT" {
                    break;
                }
            }
            drop(data);
            commands
        });

        (port, handle)
    }

    fn local_client(port: u16) -> FtpClient {
        FtpClient::new(FtpConfig {
            host: "127.0.0.1".to_string(),
            port,
            timeout_secs: 5,
            ..FtpConfig::default()
        })
    }

    #[test]
    fn test_rejected_login_still_quits() {
        let (port, server) = spawn_server(true);

        let err = local_client(port).download("coffee_feed.xml").unwrap_err();
        let commands = server.join().unwrap();

        assert!(matches!(err, SheetCastError::FtpError(_)));
        assert_eq!(commands, vec!["USER anonymous", "PASS anonymous", "QUIT"]);
    }

    #[test]
    fn test_missing_remote_file_still_quits() {
        let (port, server) = spawn_server(false);

        let err = local_client(port).download("missing.xml").unwrap_err();
        let commands = server.join().unwrap();

        assert!(matches!(err, SheetCastError::FtpError(_)));
        assert!(commands.contains(&"RETR missing.xml".to_string()));
        assert_eq!(commands.last().map(String::as_str), Some("QUIT"));
    }

    #[test]
    fn test_unreachable_server_is_an_error() {
        let client = FtpClient::new(FtpConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            timeout_secs: 2,
            ..FtpConfig::default()
        });

        let err = client.download("coffee_feed.xml").unwrap_err();
        assert!(matches!(err, SheetCastError::FtpError(_)));
    }
}
