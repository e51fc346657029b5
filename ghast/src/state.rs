use std::collections::BTreeSet;
use std::time::Duration;

use iced::keyboard;
use iced::widget::image::{FilterMethod, Handle};
use iced::widget::{column, image, pick_list, row, text};
use iced::{Alignment, Color, alignment, Element, Length, Size, Subscription, Task, Theme};
use tracing::{error, info};
use wraith::{Buttons, Config, KeyEdge, RomCatalog};

use crate::Error;
use crate::emu_core::{EmuHandle, EmuSender};
use crate::keys::Keystroke;
use crate::screen::SharedScreen;

/// How often the window picks up new frames. The render clock may run faster; the extra frames are
/// never shown.
const REDRAW: Duration = Duration::from_millis(16);

const PRESSED: f32 = 1.0;
const RELEASED: f32 = 0.3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Pressed(Keystroke),
    Released(Keystroke),
    SelectRom(String),
    Redraw,
}

pub struct Ghast {
    emu: EmuSender,
    screen: SharedScreen,
    catalog: RomCatalog,
    selected: Option<String>,
    /// Key and button name, one per binding.
    legend: Vec<(String, String)>,
    width: u32,
    height: u32,
    frame: Option<Handle>,
    pressed: BTreeSet<String>,
    status: String,
}

impl Ghast {
    fn update(&mut self, msg: Message) -> Task<Message> {
        match msg {
            Message::Pressed(Keystroke::Escape) => return iced::exit(),
            Message::Pressed(Keystroke::Key(key)) => self.emu.key(key, KeyEdge::Down),
            Message::Released(Keystroke::Key(key)) => self.emu.key(key, KeyEdge::Up),
            Message::Released(Keystroke::Escape) => {}
            Message::SelectRom(name) => {
                self.selected = Some(name.clone());
                self.emu.select_rom(name);
            }
            Message::Redraw => {
                let snapshot = self.screen.snapshot();
                if let Some(frame) = snapshot.frame {
                    self.frame = Some(frame);
                }
                self.pressed = snapshot.pressed;
                self.status = snapshot.status;
                if let Some(fault) = snapshot.fault {
                    error!(%fault, "Closing the window");
                    return iced::exit();
                }
            }
        }
        Task::none()
    }

    fn view(&self) -> Element<'_, Message> {
        let picker = pick_list(
            self.catalog.names(),
            self.selected.as_ref(),
            Message::SelectRom,
        )
        .placeholder("Choose a ROM");

        let screen: Element<'_, Message> = match &self.frame {
            Some(frame) => image(frame.clone())
                .filter_method(FilterMethod::Nearest)
                .width(Length::Fixed(self.width as f32))
                .height(Length::Fixed(self.height as f32))
                .into(),
            None => text("No ROM loaded")
                .width(Length::Fixed(self.width as f32))
                .height(Length::Fixed(self.height as f32))
                .align_x(alignment::Horizontal::Center)
                .align_y(alignment::Vertical::Center)
                .into(),
        };

        let legend = row(self.legend.iter().map(|(key, button)| {
            let alpha = if self.pressed.contains(key) {
                PRESSED
            } else {
                RELEASED
            };
            legend_entry(key, button, alpha)
        }))
        .spacing(16);

        column![
            row![picker, text(&self.status)]
                .spacing(20)
                .align_y(Alignment::Center),
            screen,
            legend,
        ]
        .padding(20)
        .spacing(20)
        .align_x(Alignment::Center)
        .into()
    }

    fn subscription(&self) -> Subscription<Message> {
        Subscription::batch([
            keyboard::on_key_press(|key, mods| Keystroke::convert(key, mods).map(Message::Pressed)),
            keyboard::on_key_release(|key, mods| {
                Keystroke::convert(key, mods).map(Message::Released)
            }),
            iced::time::every(REDRAW).map(|_| Message::Redraw),
        ])
    }
}

fn legend_entry<'a>(key: &'a str, button: &'a str, alpha: f32) -> Element<'a, Message> {
    let label = match key {
        " " => "Space",
        key => key,
    };
    text(format!("{label}: {button}"))
        .style(move |theme: &Theme| text::Style {
            color: Some(Color {
                a: alpha,
                ..theme.palette().text
            }),
        })
        .into()
}

fn button_name(buttons: Buttons) -> String {
    buttons
        .iter_names()
        .map(|(name, _)| name)
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Opens the window and runs the emulation behind it until the window closes.
pub fn run(config: &Config, rom: Option<String>) -> Result<(), Error> {
    let screen = SharedScreen::default();
    let (mut handle, catalog) = EmuHandle::construct_and_launch(config, screen.clone())?;
    let barrier = handle.barrier();
    let emu = handle.sender();
    if let Some(rom) = &rom {
        emu.select_rom(rom.clone());
    }

    let legend = config
        .key_map()
        .map_err(Error::Config)?
        .bindings()
        .map(|(key, buttons)| (key.to_owned(), button_name(buttons)))
        .collect();
    let state = Ghast {
        emu,
        screen,
        catalog,
        selected: rom,
        legend,
        width: config.output_width.get(),
        height: config.output_height.get(),
        frame: None,
        pressed: BTreeSet::new(),
        status: String::new(),
    };
    let window = Size::new(
        config.output_width.get() as f32 + 40.0,
        config.output_height.get() as f32 + 160.0,
    );

    let result = iced::application("Specters - Ghast NES Player", Ghast::update, Ghast::view)
        .subscription(Ghast::subscription)
        .window_size(window)
        .run_with(move || {
            info!("Window is up, starting the clocks");
            if let Some(barrier) = barrier {
                barrier.release();
            }
            (state, Task::none())
        });

    // Whatever ended the window, stop the emulation before reporting on it
    let stats = handle.shutdown();
    result.map_err(Error::Window)?;
    let stats = stats?;
    info!(?stats, "Emulation stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_names() {
        assert_eq!(button_name(Buttons::A), "A");
        assert_eq!(button_name(Buttons::START), "START");
        assert_eq!(button_name(Buttons::UP | Buttons::LEFT), "LEFT | UP");
    }
}
