//! Built-in message bodies and per-category variable vocabulary.
//!
//! These are the only copies of the default texts; resolution and previews
//! both read them from here.

use super::types::Category;
use super::variables::{
    BLOCO, CONDOMINIO, DATA_HORA, LOCALIZACAO, MENSAGEM, MORADOR, OBSERVACAO, PORTEIRO, PROTOCOLO,
    RETIRADO_POR, UNIDADE,
};

/// Used when a caller names a category that does not exist
pub const GENERIC_FALLBACK: &str = "Olá {MORADOR}, você tem uma nova notificação da portaria.";

const ARRIVAL_DEFAULT: &str = "📦 *Encomenda recebida!*\n\n\
Olá, *{MORADOR}*!\n\
Unidade: {UNIDADE} - Bloco {BLOCO}\n\n\
Chegou uma encomenda para você na portaria do {CONDOMINIO}.\n\
Protocolo: *{PROTOCOLO}*\n\
Recebida em: {DATA_HORA}\n\
Local: {LOCALIZACAO}\n\n\
Apresente o protocolo ao retirar.";

const PICKUP_DEFAULT: &str = "✅ *Encomenda retirada*\n\n\
Olá, *{MORADOR}*!\n\
A encomenda de protocolo *{PROTOCOLO}* (Unidade {UNIDADE} - Bloco {BLOCO}) \
foi retirada por {RETIRADO_POR} em {DATA_HORA}.\n\n\
Se você não reconhece esta retirada, procure a portaria do {CONDOMINIO}.";

const WARNING_DEFAULT: &str = "⚠️ *Aviso da portaria*\n\n\
Olá, *{MORADOR}* (Unidade {UNIDADE} - Bloco {BLOCO}).\n\
{MENSAGEM}\n\n\
{CONDOMINIO} - {DATA_HORA}";

const GENERAL_DEFAULT: &str = "Olá, *{MORADOR}*!\n\n\
{MENSAGEM}\n\n\
Atenciosamente,\n\
Administração {CONDOMINIO}";

const ARRIVAL_VARIABLES: &[&str] = &[
    MORADOR,
    UNIDADE,
    BLOCO,
    PROTOCOLO,
    DATA_HORA,
    CONDOMINIO,
    PORTEIRO,
    LOCALIZACAO,
    OBSERVACAO,
];

const PICKUP_VARIABLES: &[&str] = &[
    MORADOR,
    UNIDADE,
    BLOCO,
    PROTOCOLO,
    DATA_HORA,
    CONDOMINIO,
    PORTEIRO,
    RETIRADO_POR,
];

const WARNING_VARIABLES: &[&str] = &[MORADOR, UNIDADE, BLOCO, MENSAGEM, DATA_HORA, CONDOMINIO];

const GENERAL_VARIABLES: &[&str] = &[MORADOR, UNIDADE, BLOCO, MENSAGEM, CONDOMINIO];

/// Default body of a category
pub fn default_template(category: Category) -> &'static str {
    match category {
        Category::Arrival => ARRIVAL_DEFAULT,
        Category::Pickup => PICKUP_DEFAULT,
        Category::Warning => WARNING_DEFAULT,
        Category::General => GENERAL_DEFAULT,
    }
}

/// Placeholder names offered as quick-insert buttons for a category.
///
/// Descriptive only: substitution accepts any name.
pub fn available_variables(category: Category) -> &'static [&'static str] {
    match category {
        Category::Arrival => ARRIVAL_VARIABLES,
        Category::Pickup => PICKUP_VARIABLES,
        Category::Warning => WARNING_VARIABLES,
        Category::General => GENERAL_VARIABLES,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::template::substitution::extract_placeholders;

    #[test]
    fn test_defaults_only_use_their_vocabulary() {
        for category in Category::ALL {
            let vocabulary = available_variables(category);
            for name in extract_placeholders(default_template(category)) {
                assert!(
                    vocabulary.contains(&name.as_str()),
                    "{} default uses {} outside its vocabulary",
                    category,
                    name
                );
            }
        }
    }

    #[test]
    fn test_defaults_are_distinct_and_non_empty() {
        for category in Category::ALL {
            assert!(!default_template(category).trim().is_empty());
        }
        assert_ne!(
            default_template(Category::Arrival),
            default_template(Category::Pickup)
        );
    }

    #[test]
    fn test_arrival_vocabulary() {
        let vars = available_variables(Category::Arrival);
        assert!(vars.contains(&"PROTOCOLO"));
        assert!(vars.contains(&"DATA_HORA"));
        assert!(!vars.contains(&"RETIRADO_POR"));
    }
}
