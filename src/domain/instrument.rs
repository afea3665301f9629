//! Currency-pair conventions: pip size and quoted price precision.

/// Pip and precision conventions for a currency pair, derived from its
/// quote currency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Instrument {
    pub pip_size: f64,
    pub price_decimals: u32,
}

impl Instrument {
    /// `EURUSD`, `EUR/USD` and `eur_usd` are all accepted. Anything that is
    /// not a six-letter pair is JPY-quoted only if it mentions JPY at all.
    pub fn from_symbol(symbol: &str) -> Self {
        if quotes_jpy(symbol) {
            Instrument {
                pip_size: 0.01,
                price_decimals: 3,
            }
        } else {
            Instrument {
                pip_size: 0.0001,
                price_decimals: 5,
            }
        }
    }

    pub fn round_price(&self, price: f64) -> f64 {
        round_to(price, self.price_decimals)
    }
}

fn quotes_jpy(symbol: &str) -> bool {
    let letters: String = symbol
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    if letters.len() == 6 {
        letters.ends_with("JPY")
    } else {
        letters.contains("JPY")
    }
}

pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn major_pair_uses_four_decimal_pip() {
        let inst = Instrument::from_symbol("EURUSD");
        assert_eq!(inst.pip_size, 0.0001);
        assert_eq!(inst.price_decimals, 5);
    }

    #[test]
    fn yen_quoted_pair() {
        for symbol in ["USDJPY", "EUR/JPY", "gbp_jpy"] {
            let inst = Instrument::from_symbol(symbol);
            assert_eq!(inst.pip_size, 0.01, "{symbol}");
            assert_eq!(inst.price_decimals, 3, "{symbol}");
        }
    }

    #[test]
    fn yen_base_is_not_yen_quoted() {
        assert_eq!(Instrument::from_symbol("JPYUSD").pip_size, 0.0001);
    }

    #[test]
    fn round_price_fractional_pip() {
        let inst = Instrument::from_symbol("EURUSD");
        assert_eq!(inst.round_price(1.0890000000000002), 1.089);
        assert_eq!(inst.round_price(1.091504), 1.0915);

        let yen = Instrument::from_symbol("USDJPY");
        assert_eq!(yen.round_price(151.23456), 151.235);
    }

    #[test]
    fn round_to_two_decimals() {
        assert_eq!(round_to(0.999999, 2), 1.0);
        assert_eq!(round_to(0.234, 2), 0.23);
    }
}
