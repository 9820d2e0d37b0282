//! User-facing texts.

use super::session::Stage;

pub const INTRO: &str = "Hi! 👋\n\
To build a chart press the button below or send /begin.\n\
Price history in CSV form can be downloaded from https://finance.yahoo.com/";

pub const BEGIN_LABEL: &str = "Build a chart";

pub const ASK_FILE: &str = "Upload a .csv file to build the chart from.";

pub const NO_FILE: &str = "You did not attach a file.";

pub const NOT_CSV: &str = "Oops, wrong file extension. 🤭 Please attach a .csv file.";

pub const ASK_COLUMN: &str = "Enter the name of the column to plot:";

pub const MENU: &str = "Enter the chart numbers separated by commas (1, 2, 3, 4, 5, 6):\n\
1. Historical data\n\
2. Forecast for a chosen period\n\
3. ACF/PACF\n\
4. Residuals\n\
5. Upload a new file\n\
6. End the dialogue";

pub const ASK_PERIOD: &str = "Enter the forecast period in days:";

pub const FAREWELL: &str = "Dialogue finished.\n\
Thank you for the productive work!\n\
Send 5 to upload a new file or /begin to start over.\n\
See you again! 👋";

/// Prompt repeated after invalid input in `stage`.
pub fn prompt(stage: Stage) -> &'static str {
    match stage {
        Stage::Idle | Stage::Ended => INTRO,
        Stage::AwaitingFile => ASK_FILE,
        Stage::AwaitingColumn => ASK_COLUMN,
        Stage::AwaitingPlotSelection => MENU,
        Stage::AwaitingPeriod => ASK_PERIOD,
    }
}

/// Report for a plot that could not be produced.
pub fn artifact_failed(caption: &str, reason: &dyn std::fmt::Display) -> String {
    format!("Could not build {caption}: {reason}")
}
