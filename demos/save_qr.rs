use std::error::Error;

use qrforge::{ECLevel, MaskPattern, QRBuilder, Version};

fn main() -> Result<(), Box<dyn Error>> {
    let data = "QRFORGE DEMO: ALL OPTIONS SET";

    let mut builder = QRBuilder::new(data);
    builder
        .version(Version::new(5)?) // QR version (size) - if not provided, finds smallest version to fit data
        .ec_level(ECLevel::H) // Error correction level - if not provided, highest level that fits
        .mask(MaskPattern::new(2)?); // Mask pattern - if not provided, finds best mask based on penalty score
    println!("Building QR with {}", builder.metadata());

    let qr = builder.build()?;

    // Convert to image and save
    let img = qr.render(6); // 6 pixels per module
    img.save("configured_qr.png")?;

    println!("Configured QR code saved to: configured_qr.png");
    Ok(())
}
