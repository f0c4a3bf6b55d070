//! The fixed set of race coins.
//!
//! Exactly four coins race every day. They are not stored in the database and cannot
//! be configured by users; the order of [`COINS`] is the order the price feed reports
//! them in, which is also the tie-break order at settlement.

/// A coin taking part in the daily race.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coin {
    /// Stable identifier used in bets (e.g., `"btc"`)
    pub id: &'static str,
    /// Display symbol (e.g., `"BTC"`)
    pub symbol: &'static str,
    /// Display name
    pub name: &'static str,
    /// Logo shown by clients
    pub image: &'static str,
    /// Exchange ticker used by the price feed
    pub ticker: &'static str,
}

/// The four race coins in feed order.
pub static COINS: [Coin; 4] = [
    Coin {
        id: "btc",
        symbol: "BTC",
        name: "Bitcoin",
        image: "https://assets.coingecko.com/coins/images/1/large/bitcoin.png",
        ticker: "BTCUSDT",
    },
    Coin {
        id: "eth",
        symbol: "ETH",
        name: "Ethereum",
        image: "https://assets.coingecko.com/coins/images/279/large/ethereum.png",
        ticker: "ETHUSDT",
    },
    Coin {
        id: "sol",
        symbol: "SOL",
        name: "Solana",
        image: "https://assets.coingecko.com/coins/images/4128/large/solana.png",
        ticker: "SOLUSDT",
    },
    Coin {
        id: "xrp",
        symbol: "XRP",
        name: "XRP",
        image: "https://assets.coingecko.com/coins/images/44/large/xrp-symbol-white-128.png",
        ticker: "XRPUSDT",
    },
];

/// Finds a race coin by id (case-insensitive).
#[must_use]
pub fn find_coin(coin_id: &str) -> Option<&'static Coin> {
    COINS
        .iter()
        .find(|coin| coin.id.eq_ignore_ascii_case(coin_id.trim()))
}
