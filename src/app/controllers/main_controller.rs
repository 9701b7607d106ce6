use eframe::egui;

/// What the main window's central area shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MainView {
    Groups,
    Settings,
    Logs,
}

impl Default for MainView {
    fn default() -> Self {
        MainView::Groups
    }
}

#[derive(Clone, Default)]
pub struct MainController {
    pub view: MainView,
}

impl MainController {
    pub fn new() -> Self {
        MainController { view: MainView::Groups }
    }

    pub fn render_with<F>(&self, ctx: &egui::Context, mut dispatch_fn: F)
    where
        F: FnMut(&MainController, &egui::Context),
    {
        dispatch_fn(self, ctx);
    }

    pub fn set_view(&mut self, view: MainView) {
        self.view = view;
    }
}
