//! Section labels for rendered markdown.

use enricher_shared::RenderLanguage;

/// Fixed strings used by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Labels {
    pub source: &'static str,
    pub tags: &'static str,
    pub description: &'static str,
    pub external_links: &'static str,
    pub preview_alt: &'static str,
    pub external_site: &'static str,
    pub site_title: &'static str,
    pub site_description: &'static str,
    pub site_excerpt: &'static str,
    pub site_previews: &'static str,
}

impl Labels {
    pub const ENGLISH: Labels = Labels {
        source: "Source",
        tags: "Tags",
        description: "Description",
        external_links: "External links",
        preview_alt: "preview",
        external_site: "External site",
        site_title: "Title",
        site_description: "Description",
        site_excerpt: "Text excerpt",
        site_previews: "Previews",
    };

    pub const RUSSIAN: Labels = Labels {
        source: "Источник",
        tags: "Теги",
        description: "Описание",
        external_links: "Внешние ссылки",
        preview_alt: "preview",
        external_site: "🌐 Внешний сайт",
        site_title: "Заголовок",
        site_description: "Описание",
        site_excerpt: "Фрагмент текста",
        site_previews: "Превью",
    };

    pub fn for_language(language: RenderLanguage) -> &'static Labels {
        match language {
            RenderLanguage::En => &Self::ENGLISH,
            RenderLanguage::Ru => &Self::RUSSIAN,
        }
    }
}

impl Default for Labels {
    fn default() -> Self {
        Self::ENGLISH
    }
}
