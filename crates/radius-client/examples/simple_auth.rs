use radius_client::{RadiusClient, TransportKind};
use radius_proto::{Attribute, AttributeType, Code, Packet};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 4 {
        eprintln!("Usage: {} <username> <password> <secret> [server_addr]", args[0]);
        eprintln!("Example: {} admin admin123 testing123 127.0.0.1:1812", args[0]);
        std::process::exit(1);
    }

    let username = &args[1];
    let password = &args[2];
    let secret = &args[3];
    let server_addr = args.get(4).map(|s| s.as_str()).unwrap_or("127.0.0.1:1812");

    println!("RADIUS Client Test");
    println!("==================");
    println!("Server: {}", server_addr);
    println!("Username: {}", username);
    println!();

    let client = RadiusClient::builder()
        .address(server_addr.parse()?)
        .secret(secret.as_bytes())
        .transport(TransportKind::Datagram)
        .build()?;

    // Create Access-Request packet; identifier and authenticator are
    // assigned on send, the User-Password is hidden by the codec
    let mut packet = Packet::request(Code::AccessRequest);
    packet.add_attribute(Attribute::string(AttributeType::UserName as u8, username)?);
    packet.add_attribute(Attribute::new(
        AttributeType::UserPassword as u8,
        password.as_bytes().to_vec(),
    )?);
    packet.add_attribute(Attribute::ipv4(
        AttributeType::NasIpAddress as u8,
        [127, 0, 0, 1],
    )?);

    println!("Sending Access-Request...");
    match client.send_async(packet).await {
        Ok(response) => {
            match response.code {
                Code::AccessAccept => {
                    println!("\n✓ Authentication SUCCESSFUL!");
                    println!("  Response: Access-Accept");
                }
                Code::AccessReject => {
                    println!("\n✗ Authentication FAILED!");
                    println!("  Response: Access-Reject");
                }
                Code::AccessChallenge => {
                    println!("\n→ Authentication CHALLENGE!");
                    println!("  Response: Access-Challenge");
                }
                other => {
                    println!("\n? Unexpected response: {:?}", other);
                }
            }

            // Show any Reply-Message attributes
            for attr in response.find_all_attributes(AttributeType::ReplyMessage as u8) {
                if let Ok(msg) = attr.as_string() {
                    println!("  Message: {}", msg);
                }
            }

            println!("\nResponse Details:");
            println!("  Identifier: {}", response.identifier);
            println!("  Attributes: {}", response.attributes.len());

            Ok(())
        }
        Err(e) => {
            eprintln!("\n✗ No response from server: {}", e);
            eprintln!("  Make sure the RADIUS server is running on {}", server_addr);
            Err(e.into())
        }
    }
}
