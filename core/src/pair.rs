use serde::{Deserialize, Serialize};

/// A single token on a chain. Pairs are pinned at configuration time; there is
/// no dynamic discovery, so `Token` carries exactly what the pricing formulas
/// and display layer need and nothing more.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub address: String,
    pub decimals: u8,
    pub symbol: String,
}

impl Token {
    pub fn new(address: impl Into<String>, decimals: u8, symbol: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            decimals,
            symbol: symbol.into(),
        }
    }
}

/// An unordered pair of tokens. Equality and hashing are order-independent so
/// `TokenPair::new(a, b) == TokenPair::new(b, a)`, matching the "unordered
/// set of two token identifiers" wording in §3.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub a: Token,
    pub b: Token,
}

impl TokenPair {
    pub fn new(a: Token, b: Token) -> Self {
        if a.address <= b.address {
            Self { a, b }
        } else {
            Self { a: b, b: a }
        }
    }

    /// Stable, order-independent identifier used for config keys, logging,
    /// and the scanner's per-tuple worker naming.
    pub fn id(&self) -> String {
        format!("{}/{}", self.a.symbol, self.b.symbol)
    }
}

impl PartialEq for TokenPair {
    fn eq(&self, other: &Self) -> bool {
        self.a == other.a && self.b == other.b
    }
}
impl Eq for TokenPair {}

impl std::hash::Hash for TokenPair {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.a.hash(state);
        self.b.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(sym: &str, addr: &str) -> Token {
        Token::new(addr, 18, sym)
    }

    #[test]
    fn pair_is_order_independent() {
        let matic = tok("MATIC", "0xaaa");
        let usdt = tok("USDT", "0xbbb");

        let p1 = TokenPair::new(matic.clone(), usdt.clone());
        let p2 = TokenPair::new(usdt, matic);

        assert_eq!(p1, p2);
        assert_eq!(p1.id(), p2.id());
    }
}
