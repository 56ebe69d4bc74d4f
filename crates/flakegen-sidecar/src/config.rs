use anyhow::Context;
use clap::{Parser, ValueEnum};
use flakegen::{HostNodeId, NodeId, NodeIdSource, SnowflakeId};

/// Encoding of the ID written to each connection.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReplyFormat {
    /// The ID as decimal ASCII text, with no trailing newline.
    #[default]
    Decimal,
    /// The raw `u64`, least significant byte first. What x86 clients reading
    /// a raw `u64` expect.
    Little,
    /// The raw `u64`, most significant byte first (network order).
    Big,
}

impl ReplyFormat {
    pub fn encode(self, id: SnowflakeId) -> Vec<u8> {
        match self {
            Self::Decimal => id.to_string().into_bytes(),
            Self::Little => id.to_raw().to_le_bytes().to_vec(),
            Self::Big => id.to_raw().to_be_bytes().to_vec(),
        }
    }
}

/// Runtime configuration for the `flakegen-sidecar` binary.
///
/// All values are parsed from CLI arguments or environment variables (a `.env`
/// file is loaded first if present).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "flakegen-sidecar",
    version,
    about = "A TCP sidecar that serves one Snowflake ID per connection"
)]
pub struct CliArgs {
    /// Node ID stamped into every generated ID, in `0..=1023`.
    ///
    /// Must be unique among all generators sharing an ID namespace. When unset
    /// the node ID is derived from the host's first non-loopback IPv4 address
    /// (or chosen at random if there is none), which is only unique by luck.
    ///
    /// Environment variable: `NODE_ID`
    #[arg(long, env = "NODE_ID", allow_negative_numbers = true)]
    pub node_id: Option<i64>,

    /// TCP address to listen on.
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:8080"))]
    pub server_addr: String,

    /// Encoding of the reply: decimal text, or the raw 8 bytes in little- or
    /// big-endian order.
    ///
    /// Environment variable: `REPLY_FORMAT`
    #[arg(long, env = "REPLY_FORMAT", value_enum, default_value_t = ReplyFormat::Decimal)]
    pub reply_format: ReplyFormat,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub node_id: NodeId,
    pub server_addr: String,
    pub reply_format: ReplyFormat,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let node_id = NodeIdSource::<HostNodeId>::from(args.node_id)
            .resolve()
            .context("NODE_ID must be between 0 and 1023")?;

        Ok(Self {
            node_id,
            server_addr: args.server_addr,
            reply_format: args.reply_format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("flakegen-sidecar").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn explicit_node_id() {
        let config = ServerConfig::try_from(parse(&[
            "--node-id",
            "1023",
            "--server-addr",
            "127.0.0.1:9000",
            "--reply-format",
            "big",
        ]))
        .unwrap();

        assert_eq!(config.node_id.get(), 1023);
        assert_eq!(config.server_addr, "127.0.0.1:9000");
        assert_eq!(config.reply_format, ReplyFormat::Big);
    }

    #[test]
    fn out_of_range_node_id_is_rejected() {
        for bad in ["-1", "1024"] {
            let err = ServerConfig::try_from(parse(&["--node-id", bad])).unwrap_err();
            assert!(
                err.downcast_ref::<flakegen::Error>().is_some(),
                "unexpected error: {err:#}"
            );
        }
    }

    #[test]
    fn missing_node_id_is_derived() {
        let args = CliArgs {
            node_id: None,
            server_addr: String::from("0.0.0.0:8080"),
            reply_format: ReplyFormat::default(),
        };
        let config = ServerConfig::try_from(args).unwrap();
        assert!(config.node_id.get() <= 1023);
    }

    #[test]
    fn reply_format_defaults_to_decimal() {
        let config = ServerConfig::try_from(parse(&["--node-id", "3"])).unwrap();
        assert_eq!(config.reply_format, ReplyFormat::Decimal);
    }

    #[test]
    fn reply_format_encoding() {
        let id = SnowflakeId::from_raw(0x0102_0304_0506_0708);
        assert_eq!(ReplyFormat::Decimal.encode(id), b"72623859790382856");
        assert_eq!(
            ReplyFormat::Little.encode(id),
            [0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]
        );
        assert_eq!(
            ReplyFormat::Big.encode(id),
            [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]
        );
    }
}
