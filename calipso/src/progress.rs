use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Returns a stderr progress bar counting `length` granules.
pub fn bar(header: String, length: u64) -> ProgressBar {
    let pb = ProgressBar::with_draw_target(Some(length), ProgressDrawTarget::stderr_with_hz(4));
    pb.set_prefix(header);
    pb.set_style(
        ProgressStyle::with_template("{prefix}...\n[{wide_bar:.cyan/blue}] {pos}/{len}")
            .expect("incorrect progress bar format string")
            .progress_chars("#>-"),
    );
    pb
}
