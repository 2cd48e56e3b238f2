#[derive(PartialEq, Eq, Debug, Clone)]
pub(super) enum AppMode {
    Normal,
    /// Choosing a preset from the selector.
    Presets,
    /// Browsing the selected-files panel.
    Summary,
    /// Typing a name in the "save as preset" dialog.
    SaveDialog,
    ConfirmDelete { name: String },
    /// Editing the prompt generation form.
    PromptForm,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy, Default)]
pub(super) enum FormField {
    #[default]
    Description,
    Instructions,
}

/// Inputs for the next prompt generation request.
#[derive(Debug, Clone, Default)]
pub struct PromptForm {
    pub description: String,
    pub instructions: String,
    pub template_id: Option<u32>,
    pub(super) focus: FormField,
}

impl PromptForm {
    pub fn new(description: String, instructions: String, template_id: Option<u32>) -> Self {
        PromptForm {
            description,
            instructions,
            template_id,
            focus: FormField::default(),
        }
    }

    pub(super) fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            FormField::Description => &mut self.description,
            FormField::Instructions => &mut self.instructions,
        }
    }

    pub(super) fn cycle_focus(&mut self) {
        self.focus = match self.focus {
            FormField::Description => FormField::Instructions,
            FormField::Instructions => FormField::Description,
        };
    }
}

/// Applied once the first tree and the preset list have both arrived.
#[derive(Debug, Clone, Default)]
pub struct StartupSelection {
    pub preset: Option<String>,
    pub paths: Vec<String>,
    pub removed: Vec<String>,
}
