use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar for a sequential batch of `len` items
pub fn batch_progress(len: usize, message: &'static str) -> ProgressBar {
    let bar = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
    {
        bar.set_style(style.progress_chars("##-"));
    }
    bar.set_message(message);
    bar
}
