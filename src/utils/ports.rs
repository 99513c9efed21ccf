use anyhow::Result;
use serde::Serialize;

/// One enumerated serial port
#[derive(Debug, Clone, Serialize)]
pub struct PortInfo {
    pub name: String,
    pub kind: String,
}

/// Return a sorted list of available serial ports.
pub fn enumerate_ports() -> Vec<PortInfo> {
    let mut ports = serialport::available_ports().unwrap_or_default();
    ports.sort_by_key(|p| p.port_name.clone());
    ports
        .into_iter()
        .map(|p| PortInfo {
            name: p.port_name,
            kind: format!("{:?}", p.port_type),
        })
        .collect()
}

/// Print the enumerated ports to stdout, plain or as JSON.
pub fn print_ports(json: bool) -> Result<()> {
    let ports = enumerate_ports();
    if json {
        println!("{}", serde_json::to_string(&ports)?);
    } else if ports.is_empty() {
        println!("No serial ports found");
    } else {
        for port in ports {
            println!("{}\t{}", port.name, port.kind);
        }
    }
    Ok(())
}
