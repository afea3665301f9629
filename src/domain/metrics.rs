//! Trade statistics and equity drawdown.

use chrono::NaiveDateTime;

use super::position::TradeRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeStatistics {
    pub initial_capital: f64,
    pub final_capital: f64,
    /// Percent, e.g. 2.5 for +2.5%.
    pub total_return: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    /// Break-even trades count as losing.
    pub losing_trades: usize,
    /// Percent of trades with positive P&L.
    pub win_rate: f64,
    pub average_profit: f64,
    pub max_profit: f64,
    pub max_loss: f64,
    /// Fraction of peak equity.
    pub max_drawdown: f64,
}

impl TradeStatistics {
    pub fn compute(
        initial_capital: f64,
        final_capital: f64,
        trades: &[TradeRecord],
        equity_curve: &[EquityPoint],
    ) -> Self {
        let total_return = if initial_capital > 0.0 {
            (final_capital - initial_capital) / initial_capital * 100.0
        } else {
            0.0
        };

        let total_trades = trades.len();
        let winning_trades = trades.iter().filter(|t| t.pnl > 0.0).count();
        let losing_trades = total_trades - winning_trades;

        let (win_rate, average_profit, max_profit, max_loss) = if total_trades > 0 {
            let sum: f64 = trades.iter().map(|t| t.pnl).sum();
            let max = trades.iter().map(|t| t.pnl).fold(f64::NEG_INFINITY, f64::max);
            let min = trades.iter().map(|t| t.pnl).fold(f64::INFINITY, f64::min);
            (
                winning_trades as f64 / total_trades as f64 * 100.0,
                sum / total_trades as f64,
                max,
                min,
            )
        } else {
            (0.0, 0.0, 0.0, 0.0)
        };

        TradeStatistics {
            initial_capital,
            final_capital,
            total_return,
            total_trades,
            winning_trades,
            losing_trades,
            win_rate,
            average_profit,
            max_profit,
            max_loss,
            max_drawdown: max_drawdown(equity_curve),
        }
    }
}

pub fn max_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    let Some(first) = equity_curve.first() else {
        return 0.0;
    };

    let mut peak = first.equity;
    let mut max_dd = 0.0_f64;

    for point in equity_curve {
        if point.equity > peak {
            peak = point.equity;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - point.equity) / peak);
        }
    }

    max_dd
}
