//! Wi-Fi station and weather-server client over CYW43 + embassy-net.
//!
//! Networks are joined as open networks; the data request is a plain
//! HTTP/1.1 GET answered with the station's latest snapshot.

use core::fmt::Write as _;

use cyw43::{Control, JoinOptions, ScanOptions};
use embassy_net::tcp::TcpSocket;
use embassy_net::{Ipv4Address, Stack};
use embassy_time::{with_timeout, Duration};
use embedded_io_async::Write;
use heapless::{String, Vec};

use crate::config::{
    DHCP_TIMEOUT_MS, MAX_NETWORKS, SERVER_ADDRESS, SERVER_PATH, SERVER_PORT, SERVER_TIMEOUT_MS,
};
use crate::error::Error;
use crate::link::{DataSource, WifiLink};
use crate::payload::{http_body, parse_weather};
use crate::weather::WeatherStationData;

/// Longest response we keep (headers + body).
const RESPONSE_SIZE: usize = 1024;

pub struct Station {
    control: Control<'static>,
    stack: Stack<'static>,
    networks: Vec<String<32>, MAX_NETWORKS>,
    joined: bool,
    latest: WeatherStationData,
    fresh: bool,
}

impl Station {
    pub fn new(control: Control<'static>, stack: Stack<'static>) -> Self {
        Self {
            control,
            stack,
            networks: Vec::new(),
            joined: false,
            latest: WeatherStationData::default(),
            fresh: false,
        }
    }

    async fn fetch(&mut self) -> Result<WeatherStationData, Error> {
        let mut rx_buffer = [0u8; RESPONSE_SIZE];
        let mut tx_buffer = [0u8; 256];
        let mut socket = TcpSocket::new(self.stack, &mut rx_buffer, &mut tx_buffer);
        socket.set_timeout(Some(Duration::from_millis(SERVER_TIMEOUT_MS)));

        let [a, b, c, d] = SERVER_ADDRESS;
        socket
            .connect((Ipv4Address::new(a, b, c, d), SERVER_PORT))
            .await
            .map_err(|e| {
                warn!("Server connect failed: {:?}", e);
                Error::RequestFailed
            })?;

        let mut request: String<128> = String::new();
        write!(
            request,
            "GET {} HTTP/1.1\r\nHost: {}.{}.{}.{}\r\nConnection: close\r\n\r\n",
            SERVER_PATH, a, b, c, d
        )
        .map_err(|_| Error::BufferOverflow)?;
        socket
            .write_all(request.as_bytes())
            .await
            .map_err(|_| Error::RequestFailed)?;

        let mut response = [0u8; RESPONSE_SIZE];
        let mut len = 0;
        while len < response.len() {
            match socket.read(&mut response[len..]).await {
                Ok(0) => break,
                Ok(n) => len += n,
                Err(e) => {
                    warn!("Server read failed: {:?}", e);
                    return Err(Error::RequestFailed);
                }
            }
        }
        socket.close();

        parse_weather(http_body(&response[..len])?)
    }
}

impl WifiLink for Station {
    async fn scan_networks(&mut self) {
        self.networks.clear();
        let mut scanner = self.control.scan(ScanOptions::default()).await;

        while let Some(bss) = scanner.next().await {
            let len = (bss.ssid_len as usize).min(bss.ssid.len());
            let Ok(ssid) = core::str::from_utf8(&bss.ssid[..len]) else {
                continue;
            };
            if ssid.is_empty() || self.networks.iter().any(|known| known == ssid) {
                continue;
            }

            let mut name = String::new();
            if name.push_str(ssid).is_err() {
                continue;
            }
            if self.networks.push(name).is_err() {
                break;
            }
        }
        info!("Scan complete: {} networks", self.networks.len());
    }

    fn network_count(&self) -> u8 {
        self.networks.len() as u8
    }

    fn network_name(&self, index: u8) -> &str {
        self.networks
            .get(index as usize)
            .map(|name| name.as_str())
            .unwrap_or("")
    }

    async fn connect(&mut self, index: u8) -> Result<(), Error> {
        let ssid = self
            .networks
            .get(index as usize)
            .cloned()
            .ok_or(Error::ConnectFailed)?;

        if self.joined {
            self.control.leave().await;
            self.joined = false;
        }

        info!("Joining {}", ssid.as_str());
        self.control
            .join(&ssid, JoinOptions::new_open())
            .await
            .map_err(|e| {
                warn!("Join failed: status {}", e.status);
                Error::ConnectFailed
            })?;
        self.joined = true;

        match with_timeout(
            Duration::from_millis(DHCP_TIMEOUT_MS),
            self.stack.wait_config_up(),
        )
        .await
        {
            Ok(()) => {
                if let Some(config) = self.stack.config_v4() {
                    info!("DHCP address {}", config.address);
                }
                Ok(())
            }
            Err(_) => {
                warn!("No DHCP lease");
                self.control.leave().await;
                self.joined = false;
                Err(Error::ConnectFailed)
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.joined && self.stack.is_config_up()
    }
}

impl DataSource for Station {
    async fn request_last_data(&mut self) -> Result<(), Error> {
        if !self.is_connected() {
            return Err(Error::RequestFailed);
        }
        let data = self.fetch().await?;
        self.latest = data;
        self.fresh = true;
        Ok(())
    }

    fn has_new_data(&self) -> bool {
        self.fresh
    }

    fn consume_latest_data(&mut self) -> WeatherStationData {
        self.fresh = false;
        self.latest
    }
}
