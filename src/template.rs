//! Starter document printed by `md2gost --template`.

/// Example report covering every supported construct. Edit and convert.
pub const EXAMPLE_TEMPLATE: &str = r#"---
title: Исследование сетевых протоколов
author: Иванов И.И.
group: ИТ-21
teacher: Петров П.П.
subject: Компьютерные сети
work_number: 1
---

# Введение

Цель работы: изучить **структуру пакетов** протоколов *TCP* и *UDP*
с помощью утилиты `tcpdump`.

# Ход работы

## Подготовка стенда

1. Установить анализатор трафика.
2. Запустить захват на интерфейсе `eth0`.

Используемые инструменты:

- Wireshark
- tcpdump

## Результаты измерений

| Протокол | Заголовок, байт | Надёжность |
|----------|-----------------|------------|
| TCP      | 20              | да         |
| UDP      | 8               | нет        |

```bash
sudo tcpdump -i eth0 -c 100 tcp
```

> Захват трафика требует прав администратора.

# Заключение

В ходе работы изучены заголовки протоколов транспортного уровня.
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Block;
    use crate::pipeline::parse::parse_markdown;

    #[test]
    fn template_parses_with_metadata_and_every_block_kind() {
        let (meta, blocks) = parse_markdown(EXAMPLE_TEMPLATE).unwrap();
        assert_eq!(meta.author, "Иванов И.И.");
        assert_eq!(meta.work_number, "1");

        let has = |pred: fn(&Block) -> bool| blocks.iter().any(pred);
        assert!(has(|b| matches!(b, Block::Heading { level: 2, .. })));
        assert!(has(|b| matches!(b, Block::List { ordered: true, .. })));
        assert!(has(|b| matches!(b, Block::List { ordered: false, .. })));
        assert!(has(|b| matches!(b, Block::Table { .. })));
        assert!(has(|b| matches!(b, Block::CodeBlock { .. })));
        assert!(has(|b| matches!(b, Block::Blockquote { .. })));
    }
}
