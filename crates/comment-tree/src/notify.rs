use crate::model::View;

/// Shows a message to the user. Called when a reply hits the reply cap.
pub trait Notifier {
    fn notify(&mut self, message: &str);
}

impl<F> Notifier for F
where
    F: FnMut(&str),
{
    fn notify(&mut self, message: &str) {
        self(message)
    }
}

/// Default notifier: writes the message to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, message: &str) {
        log::warn!("{}", message);
    }
}

/// Receives a fresh [`View`] after every state change.
pub trait Renderer {
    fn render(&mut self, view: &View);
}

impl<F> Renderer for F
where
    F: FnMut(&View),
{
    fn render(&mut self, view: &View) {
        self(view)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRenderer;

impl Renderer for NoopRenderer {
    fn render(&mut self, _view: &View) {}
}
