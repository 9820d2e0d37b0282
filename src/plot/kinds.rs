//! Plot identifiers and menu selection parsing.

use std::collections::BTreeSet;
use std::fmt;

/// A renderable artifact.
///
/// The derived ordering is the delivery order: time series, forecast,
/// ACF/PACF, residuals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PlotKind {
    TimeSeries,
    Forecast,
    AcfPacf,
    Residuals,
}

impl PlotKind {
    /// All kinds in delivery order.
    pub const ALL: [PlotKind; 4] = [
        PlotKind::TimeSeries,
        PlotKind::Forecast,
        PlotKind::AcfPacf,
        PlotKind::Residuals,
    ];

    /// Menu token.
    pub fn token(self) -> char {
        match self {
            PlotKind::TimeSeries => '1',
            PlotKind::Forecast => '2',
            PlotKind::AcfPacf => '3',
            PlotKind::Residuals => '4',
        }
    }

    /// Artifact file name inside the session directory.
    pub fn file_name(self) -> &'static str {
        match self {
            PlotKind::TimeSeries => "time_series.png",
            PlotKind::Forecast => "forecast.png",
            PlotKind::AcfPacf => "acf_pacf.png",
            PlotKind::Residuals => "residuals.png",
        }
    }

    /// Caption sent with the image. The forecast caption names the horizon.
    pub fn caption(self, period: Option<usize>) -> String {
        match (self, period) {
            (PlotKind::TimeSeries, _) => "Time series".to_string(),
            (PlotKind::Forecast, Some(days)) => format!("Forecast for {days} days"),
            (PlotKind::Forecast, None) => "Forecast".to_string(),
            (PlotKind::AcfPacf, _) => "ACF and PACF".to_string(),
            (PlotKind::Residuals, _) => "Model residuals".to_string(),
        }
    }
}

impl fmt::Display for PlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlotKind::TimeSeries => "time-series",
            PlotKind::Forecast => "forecast",
            PlotKind::AcfPacf => "acf-pacf",
            PlotKind::Residuals => "residuals",
        };
        f.write_str(name)
    }
}

/// One entry of the plot menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MenuChoice {
    Plot(PlotKind),
    /// Upload a different file.
    Reupload,
    /// Leave the dialogue.
    End,
}

impl MenuChoice {
    /// Parse a single menu token (`1`..`6`).
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim() {
            "1" => Some(MenuChoice::Plot(PlotKind::TimeSeries)),
            "2" => Some(MenuChoice::Plot(PlotKind::Forecast)),
            "3" => Some(MenuChoice::Plot(PlotKind::AcfPacf)),
            "4" => Some(MenuChoice::Plot(PlotKind::Residuals)),
            "5" => Some(MenuChoice::Reupload),
            "6" => Some(MenuChoice::End),
            _ => None,
        }
    }
}

/// Parsed reply to the plot menu.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Requested plots in delivery order.
    pub plots: BTreeSet<PlotKind>,
    pub reupload: bool,
    pub end: bool,
}

impl Selection {
    /// Parse comma-separated menu tokens. Unknown tokens are ignored.
    ///
    /// ```
    /// use forecast_dialog::plot::{PlotKind, Selection};
    ///
    /// let selection = Selection::parse("3, 1,x");
    /// let plots: Vec<_> = selection.plots.into_iter().collect();
    /// assert_eq!(plots, vec![PlotKind::TimeSeries, PlotKind::AcfPacf]);
    /// ```
    pub fn parse(text: &str) -> Self {
        text.split(',')
            .filter_map(MenuChoice::from_token)
            .fold(Selection::default(), |mut selection, choice| {
                match choice {
                    MenuChoice::Plot(kind) => {
                        selection.plots.insert(kind);
                    }
                    MenuChoice::Reupload => selection.reupload = true,
                    MenuChoice::End => selection.end = true,
                }
                selection
            })
    }

    /// No recognised token was found.
    pub fn is_empty(&self) -> bool {
        self.plots.is_empty() && !self.reupload && !self.end
    }

    pub fn wants_forecast(&self) -> bool {
        self.plots.contains(&PlotKind::Forecast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_order_follows_menu() {
        let mut kinds = vec![
            PlotKind::Residuals,
            PlotKind::TimeSeries,
            PlotKind::AcfPacf,
            PlotKind::Forecast,
        ];
        kinds.sort();
        assert_eq!(kinds, PlotKind::ALL.to_vec());
        let tokens: String = PlotKind::ALL.iter().map(|k| k.token()).collect();
        assert_eq!(tokens, "1234");
    }

    #[test]
    fn tokens_round_trip_through_menu() {
        for kind in PlotKind::ALL {
            assert_eq!(
                MenuChoice::from_token(&kind.token().to_string()),
                Some(MenuChoice::Plot(kind))
            );
        }
        assert_eq!(MenuChoice::from_token(" 5 "), Some(MenuChoice::Reupload));
        assert_eq!(MenuChoice::from_token("6"), Some(MenuChoice::End));
        assert_eq!(MenuChoice::from_token("7"), None);
        assert_eq!(MenuChoice::from_token(""), None);
    }

    #[test]
    fn selection_deduplicates_and_orders() {
        let selection = Selection::parse("4,1,4, 2");
        let plots: Vec<_> = selection.plots.iter().copied().collect();
        assert_eq!(plots, vec![PlotKind::TimeSeries, PlotKind::Forecast, PlotKind::Residuals]);
        assert!(selection.wants_forecast());
        assert!(!selection.end && !selection.reupload);
    }

    #[test]
    fn selection_flags_control_tokens() {
        let selection = Selection::parse("2,5,6");
        assert!(selection.end);
        assert!(selection.reupload);
        assert!(selection.wants_forecast());
    }

    #[test]
    fn empty_and_garbage_selection() {
        assert!(Selection::parse("").is_empty());
        assert!(Selection::parse("abc, 9,,").is_empty());
        assert!(!Selection::parse("abc,3").is_empty());
    }

    #[test]
    fn captions_and_file_names() {
        assert_eq!(PlotKind::Forecast.caption(Some(30)), "Forecast for 30 days");
        assert_eq!(PlotKind::AcfPacf.caption(None), "ACF and PACF");
        assert_eq!(PlotKind::Residuals.file_name(), "residuals.png");
        assert_eq!(PlotKind::TimeSeries.to_string(), "time-series");
    }
}
