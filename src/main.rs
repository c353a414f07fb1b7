use clap::Parser;
use color_eyre::eyre::Error;
use jtmap::{
    ConsoleSurface,
    Enricher,
    Ingest,
    config::{
        Args,
        Command,
        ListenArgs,
        SendQsoArgs,
    },
};
use jtmap_lookup::Resolver;
use jtmap_wsjtx::{
    AdifRecord,
    encode_logged_adif,
};
use tokio::net::UdpSocket;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let _ = dotenvy::dotenv();
    color_eyre::install()?;

    let args = Args::parse();

    match args.command {
        Command::Listen(args) => {
            tracing_subscriber::fmt()
                .with_max_level(args.log_level)
                .init();
            listen(args).await?;
        }
        Command::SendQso(args) => {
            tracing_subscriber::fmt::init();
            send_qso(args).await?;
        }
    }

    Ok(())
}

async fn listen(args: ListenArgs) -> Result<(), Error> {
    let home_position = args.home_position()?;
    let resolver = args
        .provider()?
        .map(|provider| Resolver::new(provider, args.lookup_timeout))
        .transpose()?;
    if resolver.is_none() {
        tracing::info!("no lookup service selected, using logged data only");
    }

    let enricher = Enricher::new(resolver, home_position, args.units);
    let mut ingest = Ingest::bind(args.bind_address(), enricher)
        .await?
        .with_poll_interval(args.poll_interval);

    tokio::select! {
        _ = ingest.run(ConsoleSurface::stdout()) => {}
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("shutting down");
        }
    }

    Ok(())
}

async fn send_qso(args: SendQsoArgs) -> Result<(), Error> {
    let mut record = AdifRecord::default()
        .with("call", args.call)
        .with("mode", args.mode)
        .with("band", args.band);
    for (name, value) in [
        ("gridsquare", args.gridsquare),
        ("station_callsign", args.station_callsign),
        ("my_gridsquare", args.my_gridsquare),
    ] {
        if let Some(value) = value {
            record.insert(name, value);
        }
    }

    let datagram = encode_logged_adif(&record);
    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    socket.send_to(&datagram, &args.address).await?;
    tracing::info!(address = %args.address, %record, "sent qso");

    Ok(())
}
