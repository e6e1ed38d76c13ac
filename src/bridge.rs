//! Host bridge: decoded host commands in, serialised notifications out

use std::io::{BufRead, Write};

use anyhow::Context;
use log::{debug, warn};

use crate::events::NotificationQueue;
use crate::protocol::{HostCommand, Notification};
use crate::viewer::Viewer;

/// Routes [`HostCommand`]s to a [`Viewer`] and collects what it emits
pub struct HostBridge {
    viewer: Viewer,
    outbox: NotificationQueue,
}

impl HostBridge {
    pub fn new(mut viewer: Viewer) -> Self {
        let outbox = NotificationQueue::new();
        viewer.subscribe(outbox.clone());
        Self { viewer, outbox }
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    pub fn viewer_mut(&mut self) -> &mut Viewer {
        &mut self.viewer
    }

    /// Notifications emitted since the last drain
    pub fn drain(&self) -> Vec<Notification> {
        self.outbox.drain()
    }

    /// Decode and execute one JSON message, returning everything it emitted
    pub fn handle_message(&mut self, message: &str) -> Vec<Notification> {
        match HostCommand::decode(message) {
            Ok(command) => self.execute(command),
            Err(e) => {
                warn!("Rejected host message {message:?}: {e}");
                self.viewer.report(format!("Invalid message: {e}"));
            }
        }
        self.drain()
    }

    pub fn execute(&mut self, command: HostCommand) {
        debug!("host command {command:?}");
        let viewer = &mut self.viewer;
        match command {
            HostCommand::LoadUrl { url } => viewer.load_from_url(&url),
            HostCommand::LoadBase64 { data } => viewer.load_from_base64(&data),
            HostCommand::CloseDocument => viewer.close_document(),

            HostCommand::GoToPage { page_number } => viewer.go_to_page(page_number),
            HostCommand::NextPage => viewer.next_page(),
            HostCommand::PreviousPage => viewer.previous_page(),
            HostCommand::FirstPage => viewer.first_page(),
            HostCommand::LastPage => viewer.last_page(),

            HostCommand::ZoomIn => viewer.zoom_in(),
            HostCommand::ZoomOut => viewer.zoom_out(),
            HostCommand::SetZoom { percentage } => viewer.set_zoom_percentage(percentage),
            HostCommand::SetZoomLevel { zoom_level } => viewer.set_zoom_level(zoom_level),
            HostCommand::FitWidth => viewer.fit_width(),
            HostCommand::FitPage => viewer.fit_page(),

            HostCommand::RotateClockwise => viewer.rotate_clockwise(),
            HostCommand::RotateCounterClockwise => viewer.rotate_counter_clockwise(),

            HostCommand::Search {
                text,
                case_sensitive,
            } => viewer.search(&text, case_sensitive),
            HostCommand::FindNext => viewer.find_next(),
            HostCommand::FindPrevious => viewer.find_previous(),
            HostCommand::ClearSearch => viewer.clear_search(),

            HostCommand::SelectText { page_number, text } => viewer.select_text(page_number, &text),
            HostCommand::ClearSelection => viewer.clear_selection(),
            HostCommand::HighlightSelection { color } => viewer.highlight_selection(&color),
            HostCommand::AddNote {
                page_number,
                x,
                y,
                text,
            } => viewer.add_note(page_number, x, y, &text),
            HostCommand::EnableDrawing { color, width } => viewer.enable_drawing(&color, width),
            HostCommand::DisableDrawing => viewer.disable_drawing(),
            HostCommand::AddStroke { points } => viewer.add_stroke(points),
            HostCommand::SelectAnnotation { annotation_id } => {
                viewer.select_annotation(&annotation_id)
            }
            HostCommand::ClearAnnotations => viewer.clear_annotations(),
            HostCommand::ExportAnnotations { request_id } => {
                let annotations = viewer
                    .export_annotations()
                    .unwrap_or_else(|| "[]".to_string());
                self.outbox.push(Notification::AnnotationsExported {
                    request_id,
                    annotations,
                });
            }
            HostCommand::ImportAnnotations { annotations } => {
                viewer.import_annotations(&annotations)
            }

            HostCommand::Print => viewer.print(),
            HostCommand::Download { filename } => viewer.download(filename.as_deref()),

            HostCommand::ToggleSidebar => viewer.toggle_sidebar(),
            HostCommand::SetSidebarVisible { visible } => viewer.set_sidebar_visible(visible),
            HostCommand::ShowThumbnails => viewer.show_thumbnails(),
            HostCommand::ShowBookmarks => viewer.show_bookmarks(),
            HostCommand::SetAnnotationsEnabled { enabled } => {
                viewer.set_annotations_enabled(enabled)
            }

            HostCommand::SetContainerSize { width, height } => {
                viewer.set_container_size(width, height)
            }
            HostCommand::Scroll { scroll_top } => viewer.on_scroll(scroll_top),
            HostCommand::ClickThumbnail { page_number } => viewer.click_thumbnail(page_number),
            HostCommand::ClickBookmark { path } => viewer.click_bookmark(&path),
            HostCommand::FollowLink { url } => viewer.follow_link(&url),

            HostCommand::Unrecognized { kind } => {
                warn!("Unrecognized host command {kind:?}");
                viewer.report(format!("Unknown command: {kind}"));
            }
        }
    }

    /// Serve JSON lines from `input` until EOF, writing one JSON line per
    /// notification to `output`.
    ///
    /// Queued render work advances by one tick after every message and is
    /// finished before returning.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> anyhow::Result<()> {
        write_notifications(&mut output, self.drain())?;

        for line in input.lines() {
            let line = line.context("Failed to read host input")?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut emitted = self.handle_message(line);
            self.viewer.tick();
            emitted.extend(self.drain());
            write_notifications(&mut output, emitted)?;
        }

        while self.viewer.tick() {}
        write_notifications(&mut output, self.drain())?;
        Ok(())
    }
}

fn write_notifications<W: Write>(output: &mut W, notifications: Vec<Notification>) -> anyhow::Result<()> {
    for notification in notifications {
        let line = notification.to_json()?;
        writeln!(output, "{line}").context("Failed to write notification")?;
    }
    output.flush().context("Failed to flush host output")?;
    Ok(())
}
