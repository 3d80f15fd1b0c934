//! Temporizadores periódicos opcionales para los bucles `select!`.
use std::time::Duration;

use tokio::time::{self, Instant, Interval};

/// Intervalo cuyo primer tick llega tras un periodo completo. Un periodo nulo
/// (o ausente) desactiva el temporizador.
pub(crate) fn ticker(start: Instant, period: Option<Duration>) -> Option<Interval> {
    period.filter(|p| !p.is_zero())
          .map(|p| time::interval_at(start + p, p))
}

/// Espera el siguiente tick; sin temporizador no termina nunca.
pub(crate) async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
