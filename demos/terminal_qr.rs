use std::error::Error;

use qrforge::QRBuilder;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    // RUST_LOG=qrforge=debug shows the negotiation steps
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let data = if args.is_empty() { "Hello, World!".to_string() } else { args.join(" ") };

    let qr = QRBuilder::new(&data).build()?;

    print!("{}", qr.to_str(1));
    println!(
        "Version: {}, Ec level: {:?}, Mask: {:?}",
        *qr.version(),
        qr.ec_level(),
        qr.mask().map(|m| *m)
    );
    Ok(())
}
