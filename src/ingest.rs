use std::{
    net::SocketAddr,
    time::Duration,
};

use jtmap_wsjtx::MAX_DATAGRAM_SIZE;
use tokio::net::{
    ToSocketAddrs,
    UdpSocket,
};

use crate::{
    Enricher,
    Error,
    Outcome,
    SkipReason,
    Surface,
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Receives datagrams from WSJT-X and hands every logged QSO to the
/// [`Enricher`].
///
/// Waiting for a datagram never takes longer than the poll interval. If
/// nothing arrived by then, the surface gets a tick.
#[derive(Debug)]
pub struct Ingest {
    socket: UdpSocket,
    poll_interval: Duration,
    enricher: Enricher,
    buffer: Box<[u8; MAX_DATAGRAM_SIZE]>,
}

impl Ingest {
    pub async fn bind(address: impl ToSocketAddrs, enricher: Enricher) -> Result<Self, Error> {
        let socket = UdpSocket::bind(address).await?;
        tracing::info!(address = ?socket.local_addr()?, "listening for WSJT-X");
        Ok(Self::from_socket(socket, enricher))
    }

    pub fn from_socket(socket: UdpSocket, enricher: Enricher) -> Self {
        Self {
            socket,
            poll_interval: DEFAULT_POLL_INTERVAL,
            enricher,
            buffer: Box::new([0; MAX_DATAGRAM_SIZE]),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.socket.local_addr()?)
    }

    pub fn enricher(&self) -> &Enricher {
        &self.enricher
    }

    /// Runs forever. Cancel the future to stop.
    pub async fn run(&mut self, mut surface: impl Surface) {
        loop {
            self.poll(&mut surface).await;
        }
    }

    /// Waits for at most one poll interval and handles a datagram if one
    /// arrived.
    ///
    /// Returns `None` if nothing was received.
    pub async fn poll(&mut self, surface: &mut impl Surface) -> Option<Outcome> {
        let received =
            tokio::time::timeout(self.poll_interval, self.socket.recv_from(&mut self.buffer[..]))
                .await;

        match received {
            Err(_) => {
                surface.tick();
                None
            }
            Ok(Err(error)) => {
                tracing::warn!(?error, "failed to receive datagram");
                // errors like ICMP port unreachable can repeat immediately
                surface.tick();
                tokio::time::sleep(self.poll_interval).await;
                None
            }
            Ok(Ok((length, sender))) => {
                tracing::trace!(%sender, length, "received datagram");
                let datagram = self.buffer[..length].to_vec();
                let outcome = self.handle_datagram(&datagram).await;
                if let Outcome::Enriched(contact) = &outcome {
                    surface.show(contact);
                }
                Some(outcome)
            }
        }
    }

    pub async fn handle_datagram(&mut self, datagram: &[u8]) -> Outcome {
        match jtmap_wsjtx::parse(datagram) {
            Ok(Some(qso)) => self.enricher.enrich(&qso).await,
            Ok(None) => Outcome::Skipped(SkipReason::NotLoggedQso),
            Err(error) => {
                tracing::warn!(?error, length = datagram.len(), "malformed datagram");
                Outcome::Skipped(SkipReason::Malformed)
            }
        }
    }
}
