use std::{
    net::{
        IpAddr,
        Ipv4Addr,
        SocketAddr,
    },
    time::Duration,
};

use clap::{
    Parser,
    Subcommand,
    ValueEnum,
};
use jtmap_lookup::{
    Callook,
    HamDb,
    Provider,
    Qrz,
    QrzCredentials,
};
use jtmap_types::{
    Coordinate,
    DistanceUnit,
};
use url::Url;

use crate::Error;

/// UDP server port WSJT-X sends to by default.
pub const DEFAULT_PORT: u16 = 2237;

#[derive(Debug, Parser)]
#[clap(version, about)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Listen for QSOs logged by WSJT-X.
    Listen(ListenArgs),

    /// Send a `LoggedADIF` message, like WSJT-X does when a QSO is logged.
    SendQso(SendQsoArgs),
}

#[derive(Debug, clap::Args)]
pub struct ListenArgs {
    /// Only listen on the loopback interface.
    #[clap(long, conflicts_with = "bind")]
    pub localhost: bool,

    /// Address to listen on.
    ///
    /// Default: all interfaces
    #[clap(long, env = "JTMAP_BIND")]
    pub bind: Option<IpAddr>,

    #[clap(short, long, env = "JTMAP_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Latitude of the home station.
    ///
    /// If not set, the home position is approximated from the gridsquare
    /// WSJT-X logs for the first QSO.
    #[clap(long, env = "JTMAP_LATITUDE", requires = "longitude", allow_negative_numbers = true)]
    pub latitude: Option<f64>,

    /// Longitude of the home station.
    #[clap(long, env = "JTMAP_LONGITUDE", requires = "latitude", allow_negative_numbers = true)]
    pub longitude: Option<f64>,

    /// Look up callsigns with this service.
    #[clap(short, long, env = "JTMAP_LOOKUP")]
    pub lookup: Option<LookupService>,

    /// Use a different base URL for the lookup service.
    #[clap(long, env = "JTMAP_LOOKUP_URL", requires = "lookup")]
    pub lookup_url: Option<Url>,

    #[clap(long, env = "QRZ_USERNAME")]
    pub qrz_username: Option<String>,

    #[clap(long, env = "QRZ_PASSWORD", hide_env_values = true)]
    pub qrz_password: Option<String>,

    /// Timeout for callsign lookups.
    #[clap(long, default_value = "10s", value_parser = humantime::parse_duration)]
    pub lookup_timeout: Duration,

    /// How long to wait for a datagram before giving the surface a tick.
    #[clap(long, default_value = "50ms", value_parser = humantime::parse_duration)]
    pub poll_interval: Duration,

    /// Distance unit: km or miles
    #[clap(short, long, env = "JTMAP_UNITS", default_value = "miles")]
    pub units: DistanceUnit,

    #[clap(long, env = "JTMAP_LOG_LEVEL", default_value = "info")]
    pub log_level: tracing::Level,
}

impl ListenArgs {
    pub fn bind_address(&self) -> SocketAddr {
        let ip = if self.localhost {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        }
        else {
            self.bind.unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
        };
        SocketAddr::new(ip, self.port)
    }

    pub fn home_position(&self) -> Result<Option<Coordinate>, Error> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => {
                Coordinate::new(latitude, longitude)
                    .map(Some)
                    .ok_or(Error::InvalidHomePosition {
                        latitude,
                        longitude,
                    })
            }
            _ => Ok(None),
        }
    }

    pub fn provider(&self) -> Result<Option<Provider>, Error> {
        let Some(lookup) = self.lookup
        else {
            return Ok(None);
        };
        let api_url = self.lookup_url.clone();

        let provider = match lookup {
            LookupService::Callook => {
                Provider::Callook(api_url.map(Callook::new).unwrap_or_default())
            }
            LookupService::Hamdb => Provider::HamDb(api_url.map(HamDb::new).unwrap_or_default()),
            LookupService::Qrz => {
                let (Some(username), Some(password)) =
                    (self.qrz_username.clone(), self.qrz_password.clone())
                else {
                    return Err(Error::MissingQrzCredentials);
                };
                let credentials = QrzCredentials { username, password };
                match api_url {
                    Some(api_url) => Provider::Qrz(Qrz::with_api_url(api_url, credentials)),
                    None => Provider::qrz(credentials),
                }
            }
        };

        Ok(Some(provider))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LookupService {
    /// callook.info
    Callook,
    /// hamdb.org
    Hamdb,
    /// xmldata.qrz.com (needs a subscription)
    Qrz,
}

#[derive(Debug, clap::Args)]
pub struct SendQsoArgs {
    /// Where jtmap listens.
    #[clap(short, long, default_value = "127.0.0.1:2237")]
    pub address: String,

    /// Callsign of the other station.
    #[clap(long)]
    pub call: String,

    /// Gridsquare of the other station.
    #[clap(short, long)]
    pub gridsquare: Option<String>,

    #[clap(long)]
    pub station_callsign: Option<String>,

    #[clap(long)]
    pub my_gridsquare: Option<String>,

    #[clap(long, default_value = "FT8")]
    pub mode: String,

    #[clap(long, default_value = "20m")]
    pub band: String,
}

#[cfg(test)]
mod tests {
    use std::{
        net::SocketAddr,
        time::Duration,
    };

    use clap::Parser;
    use jtmap_lookup::Provider;
    use jtmap_types::{
        Coordinate,
        DistanceUnit,
    };

    use crate::{
        Error,
        config::{
            Args,
            Command,
            ListenArgs,
        },
    };

    fn listen(args: &[&str]) -> ListenArgs {
        let args = Args::try_parse_from(["jtmap", "listen"].iter().chain(args)).unwrap();
        match args.command {
            Command::Listen(listen) => listen,
            _ => unreachable!(),
        }
    }

    #[test]
    fn it_has_sensible_defaults() {
        let args = listen(&[]);
        assert_eq!(
            args.bind_address(),
            "0.0.0.0:2237".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(args.units, DistanceUnit::Miles);
        assert_eq!(args.log_level, tracing::Level::INFO);
        assert_eq!(args.lookup_timeout, Duration::from_secs(10));
        assert_eq!(args.poll_interval, Duration::from_millis(50));
        assert!(args.home_position().unwrap().is_none());
        assert!(args.provider().unwrap().is_none());
    }

    #[test]
    fn localhost_binds_to_loopback() {
        let args = listen(&["--localhost", "--port", "2333"]);
        assert_eq!(
            args.bind_address(),
            "127.0.0.1:2333".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn it_parses_a_home_position() {
        let args = listen(&["--latitude", "42.0", "--longitude", "-71.0", "--units", "km"]);
        assert_eq!(
            args.home_position().unwrap(),
            Some(Coordinate::new_unchecked(42.0, -71.0))
        );
        assert_eq!(args.units, DistanceUnit::Kilometers);
    }

    #[test]
    fn latitude_needs_longitude() {
        assert!(Args::try_parse_from(["jtmap", "listen", "--latitude", "42.0"]).is_err());
    }

    #[test]
    fn it_rejects_out_of_range_home_positions() {
        let args = listen(&["--latitude", "95.0", "--longitude", "-71.0"]);
        assert!(matches!(
            args.home_position(),
            Err(Error::InvalidHomePosition { .. })
        ));
    }

    #[test]
    fn qrz_needs_credentials() {
        let args = listen(&["--lookup", "qrz"]);
        assert!(matches!(
            args.provider(),
            Err(Error::MissingQrzCredentials)
        ));

        let args = listen(&[
            "--lookup",
            "qrz",
            "--qrz-username",
            "k1abc",
            "--qrz-password",
            "secret",
        ]);
        assert!(matches!(args.provider(), Ok(Some(Provider::Qrz(_)))));
    }

    #[test]
    fn it_selects_a_provider() {
        let args = listen(&["--lookup", "hamdb", "--lookup-url", "http://localhost:8080/"]);
        assert!(matches!(args.provider(), Ok(Some(Provider::HamDb(_)))));

        let args = listen(&["--lookup", "callook"]);
        assert!(matches!(args.provider(), Ok(Some(Provider::Callook(_)))));
    }
}
