//! Ordered lists of interchangeable parsing strategies.

use log::debug;

/// One way of pulling a result out of some input (usually an HTML page).
///
/// Strategies are tried in order and the first `Some` wins, so new site or
/// platform quirks are added as new implementations rather than new branches.
pub trait Strategy<I: ?Sized> {
    type Output;

    fn name(&self) -> &'static str;

    fn try_extract(&self, input: &I) -> Option<Self::Output>;
}

/// Run `strategies` in order and return the first result with the strategy's name.
pub fn run_in_order<I: ?Sized, O>(
    strategies: &[&dyn Strategy<I, Output = O>],
    input: &I,
) -> Option<(&'static str, O)> {
    strategies.iter().find_map(|strategy| {
        let result = strategy.try_extract(input);
        debug!(
            "Strategy {} {}",
            strategy.name(),
            if result.is_some() { "matched" } else { "found nothing" }
        );
        result.map(|output| (strategy.name(), output))
    })
}
