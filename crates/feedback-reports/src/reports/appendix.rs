//! Fixed explanatory appendix attached to every per-student report.

pub const APPENDIX_TITLE: &str = "Anexo: indicadores y escala de evaluación";

pub const APPENDIX_PARAGRAPHS: &[&str] = &[
    "Este informe resume el desempeño del estudiante en dos competencias: Fuentes de Datos \
     Segura y Trabajo en Equipo. Cada competencia se evalúa mediante un conjunto de \
     indicadores definidos en la rúbrica del curso, y cada indicador recibe un puntaje \
     independiente.",
    "Escala de puntajes: 4 corresponde al logro completo del indicador (nota máxima); 3 indica \
     un logro adecuado con aspectos menores por mejorar; 2 refleja un logro parcial con brechas \
     relevantes; 1 señala un logro incipiente; 0 representa una ausencia crítica de evidencia \
     que requiere acciones concretas de corrección.",
    "Los resúmenes informan el número total de indicadores evaluados, la cantidad alcanzada con \
     nota máxima y los indicadores con puntaje inferior a 4, mencionados por su nombre. Cuando \
     no se registran indicadores con puntaje 0, se deja constancia del cumplimiento general de \
     los criterios mínimos establecidos.",
    "Las recomendaciones apuntan a acciones prácticas: mejorar la trazabilidad de los datos, \
     fortalecer la documentación de procesos, organizar mejor el pipeline, aplicar criterios \
     éticos en el uso de fuentes y planificar la coordinación y revisión entre pares dentro \
     del equipo.",
    "Si un estudiante no aparece en alguna de las hojas de evaluación, el resumen de esa \
     competencia queda vacío y la situación se indica en las notas del informe.",
];
